use proptest::prelude::*;
use serde_json::json;
use stratus_core::{CatalogError, EndpointFilter, ServiceCatalog, Visibility};

proptest! {
    #[test]
    fn token_id_survives_catalog_construction(id in "[a-zA-Z0-9-]{1,32}") {
        let payload = json!({
            "auth": {
                "token": {"id": id.clone()},
                "serviceCatalog": {"nova": [{"publicURL": "http://a", "region": "r1"}]}
            }
        });
        let catalog = ServiceCatalog::from_payload(&payload).expect("catalog");
        prop_assert_eq!(&catalog.token().id, &id);
    }

    #[test]
    fn duplicate_region_is_always_ambiguous(count in 2usize..6) {
        let endpoints: Vec<_> = (0..count)
            .map(|idx| json!({"region": "r1", "publicURL": format!("http://host-{idx}")}))
            .collect();
        let payload = json!({
            "access": {
                "token": {"id": "T1"},
                "serviceCatalog": {"nova": endpoints}
            }
        });
        let catalog = ServiceCatalog::from_payload(&payload).expect("catalog");
        let filter = EndpointFilter { region: Some("r1".into()), ..EndpointFilter::default() };
        let result = catalog.url_for("nova", Visibility::Public, &filter);
        let is_ambiguous = matches!(result, Err(CatalogError::AmbiguousEndpoints { ref urls, .. }) if urls.len() == count);
        prop_assert!(is_ambiguous);
    }
}

#[test]
fn unfiltered_lookup_takes_first_endpoint() {
    let payload = json!({
        "auth": {
            "token": {"id": "T1"},
            "serviceCatalog": {"nova": [
                {"publicURL": "http://first", "region": "r1"},
                {"publicURL": "http://second", "region": "r2"}
            ]}
        }
    });
    let catalog = ServiceCatalog::from_payload(&payload).expect("catalog");
    assert_eq!(
        catalog
            .url_for("nova", Visibility::Public, &EndpointFilter::default())
            .expect("url"),
        "http://first"
    );
}
