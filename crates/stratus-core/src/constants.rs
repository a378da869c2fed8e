/// Identity version assumed when the identity URL carries no `v*` segment.
pub const DEFAULT_IDENTITY_VERSION: &str = "v1.1";
pub const STANDARD_IDENTITY_VERSION: &str = "v2.0";
pub const ADMIN_IDENTITY_PORT: u16 = 35357;
pub const MAX_AUTH_REDIRECTS: usize = 5;

pub const DEFAULT_AUTH_SYSTEM: &str = "keystone";
pub const DEFAULT_SERVICE_TYPE: &str = "compute";
pub const VOLUME_SERVICE_TYPE: &str = "volume";

pub const CACHE_KEY_PLACEHOLDER: &str = "?";

pub const CATALOG_KEY: &str = "serviceCatalog";
pub const TOKEN_KEY: &str = "token";
/// Compute `versionId` values a catalog lookup accepts; other tagged versions are skipped.
pub const SUPPORTED_COMPUTE_VERSIONS: [&str; 2] = ["1.1", "2"];

pub const HEADER_AUTH_TOKEN: &str = "x-auth-token";
pub const HEADER_AUTH_USER: &str = "x-auth-user";
pub const HEADER_AUTH_KEY: &str = "x-auth-key";
pub const HEADER_PROJECT_ID: &str = "x-auth-project-id";
pub const HEADER_MANAGEMENT_URL: &str = "x-server-management-url";
pub const HEADER_COMPUTE_REQUEST_ID: &str = "x-compute-request-id";
pub const HEADER_OPENSTACK_REQUEST_ID: &str = "x-openstack-request-id";
pub const HEADER_RETRY_AFTER: &str = "retry-after";
pub const HEADER_LOCATION: &str = "location";
