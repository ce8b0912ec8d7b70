use crate::config::Config;
use crate::engine::FetchEngine;
use crate::types::{ApiResponse, CookieSet, DeviceProfile, FetchRequest, HttpMethod, Protocol};
use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagefetch", version, about = "Fetch a page as a page-content test sees it (JSON only)")]
pub struct Cli {
    /// URL to fetch; scheme is optional
    url: String,
    #[arg(long, default_value = "desktop")]
    device: DeviceProfile,
    #[arg(long, default_value = "get")]
    method: HttpMethod,
    /// http, https or none (keep the URL's own scheme)
    #[arg(long, default_value = "none")]
    protocol: Protocol,
    /// Subdomain prefix, e.g. `en` for en.example.org
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    port: Option<String>,
    #[arg(long)]
    referrer: Option<String>,
    /// Cookie sent with the request, as name=value (repeatable)
    #[arg(long = "cookie", value_parser = parse_pair)]
    cookies: Vec<(String, String)>,
    /// Form field, as name=value (repeatable)
    #[arg(long = "form", value_parser = parse_pair)]
    form: Vec<(String, String)>,
    /// CSS selector to count in the document (repeatable)
    #[arg(long = "select")]
    selectors: Vec<String>,
    /// Config file; defaults to $PAGEFETCH_CONFIG or the platform config dir
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PageSummary {
    url: String,
    final_url: String,
    device: DeviceProfile,
    status_code: u16,
    status_message: String,
    content_type: Option<String>,
    body_length: usize,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    elements: BTreeMap<String, usize>,
}

pub fn run() {
    let cli = Cli::parse();
    finish(fetch_summary(cli));
}

fn fetch_summary(cli: Cli) -> anyhow::Result<PageSummary> {
    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::discover()?,
    };
    let engine = FetchEngine::new(config)?;

    let cookies = cli
        .cookies
        .iter()
        .fold(CookieSet::empty(), |set, (k, v)| set.with(k, v));
    let mut request = FetchRequest::new(cli.url)
        .with_device(cli.device)
        .with_method(cli.method)
        .with_form(cli.form)
        .with_protocol(cli.protocol)
        .with_cookies(cookies)
        .with_test_identity("cli");
    if let Some(prefix) = cli.prefix {
        request = request.with_prefix(prefix);
    }
    if let Some(port) = cli.port {
        request = request.with_port(port);
    }
    if let Some(referrer) = cli.referrer {
        request = request.with_referrer(referrer);
    }

    let page = engine.fetch(&request)?;
    let mut elements = BTreeMap::new();
    for selector in &cli.selectors {
        let count = page
            .element_count(selector)
            .with_context(|| format!("counting {selector:?} on {}", page.url()))?;
        elements.insert(selector.clone(), count);
    }

    Ok(PageSummary {
        url: page.url().to_string(),
        final_url: page.final_url().to_string(),
        device: page.device(),
        status_code: page.status_code(),
        status_message: page.status_message().to_string(),
        content_type: page.content_type().map(str::to_string),
        body_length: page.body().len(),
        headers: page.headers().clone(),
        cookies: page.cookies().clone(),
        elements,
    })
}

fn parse_pair(raw: &str) -> anyhow::Result<(String, String)> {
    let (k, v) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got {raw:?}"))?;
    if k.trim().is_empty() {
        return Err(anyhow!("empty name in {raw:?}"));
    }
    Ok((k.trim().to_string(), v.to_string()))
}

fn finish<T: Serialize>(res: anyhow::Result<T>) {
    match res {
        Ok(v) => print_json(ApiResponse::ok(v)),
        Err(e) => print_json(ApiResponse::<()>::err(format!("{e:#}"))),
    }
}

fn print_json<T: Serialize>(val: T) {
    // pretty JSON output
    match serde_json::to_string_pretty(&val) {
        Ok(out) => println!("{out}"),
        Err(e) => eprintln!("could not encode output: {e}"),
    }
}
