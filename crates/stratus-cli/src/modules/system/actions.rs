use reqwest::Method;
use serde_json::{json, Value};

use super::args::{EndpointArgs, RequestArgs};
use crate::modules::session::{Session, Timing};

pub(crate) async fn handle_token_command(session: &mut Session) -> anyhow::Result<()> {
    session.authenticate().await?;
    let output = json!({
        "token": session.auth_token(),
        "base_url": session.base_url(),
        "tenant_id": session.tenant_id(),
        "cached": session.used_cache(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub(crate) async fn handle_endpoint_command(
    args: EndpointArgs,
    session: &mut Session,
) -> anyhow::Result<()> {
    session.authenticate().await?;
    let Some(service_type) = args.service_type else {
        let base_url = session
            .base_url()
            .ok_or_else(|| anyhow::anyhow!("no service endpoint resolved"))?;
        println!("{base_url}");
        return Ok(());
    };
    let catalog = session.catalog().ok_or_else(|| {
        anyhow::anyhow!(
            "service catalog unavailable (legacy identity protocol or cached credentials)"
        )
    })?;
    let mut filter = session.config().filter.clone();
    filter.service_type = Some(service_type.clone());
    let url = catalog.url_for(&service_type, session.config().visibility, &filter)?;
    println!("{url}");
    Ok(())
}

pub(crate) async fn handle_request_command(
    args: RequestArgs,
    session: &mut Session,
    show_timings: bool,
) -> anyhow::Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())?;
    let body = args
        .data
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()?;

    let response = match body.as_ref() {
        None if method == Method::GET => session.get(&args.path).await?,
        None if method == Method::DELETE => session.delete(&args.path).await?,
        Some(body) if method == Method::POST => session.post(&args.path, body).await?,
        Some(body) if method == Method::PUT => session.put(&args.path, body).await?,
        body => session.authenticated_request(&args.path, method, body).await?,
    };
    if let Some(body) = response.body {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    if show_timings {
        print_timings(session.timings());
        session.reset_timings();
    }
    Ok(())
}

fn print_timings(timings: &[Timing]) {
    let width = timings
        .iter()
        .map(|timing| timing.label.len())
        .max()
        .unwrap_or(0);
    for timing in timings {
        eprintln!("{:<width$}  {:>6} ms", timing.label, timing.elapsed_ms());
    }
}
