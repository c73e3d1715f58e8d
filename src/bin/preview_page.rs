//! Preview binary - runs the site against an HTML file and reports the result
//!
//! Usage:
//!   cargo run --bin preview -- index.html
//!   PREVIEW_LANG=pt PREVIEW_SCROLL_Y=900 cargo run --bin preview -- index.html
//!
//! Required (unless passed as the first argument):
//! - PREVIEW_HTML
//!
//! Optional:
//! - PREVIEW_STORE (defaults to run-history/preferences.json)
//! - PREVIEW_LANG (click the matching language option)
//! - PREVIEW_SCROLL_Y (defaults to 0)
//! - PREVIEW_VIEWPORT_HEIGHT (defaults to 900)
//! - PREVIEW_SECTION_HEIGHT (defaults to 640)
//! - PREVIEW_NAV_HEIGHT (defaults to 72)
//! - PREVIEW_CLICK_BUTTONS (click every CTA button, defaults to false)
//! - SITE_* overrides, see `SiteConfig::from_env`

use anyhow::{Context, Result};
use appsecdays_site::analytics::{CtaEvent, RecordingSink, TracingSink};
use appsecdays_site::config::SiteConfig;
use appsecdays_site::dom::{Document, Intersection, MemoryDocument, Query};
use appsecdays_site::storage::JsonFileStore;
use appsecdays_site::{PageEvent, Site};
use serde::Serialize;
use std::fs;
use tracing::info;

type PreviewSite = Site<MemoryDocument, JsonFileStore, (TracingSink, RecordingSink)>;

/// Minimal config for the preview run
struct PreviewConfig {
    html_path: String,
    store_path: String,
    language: Option<String>,
    scroll_y: f64,
    viewport_height: f64,
    section_height: f64,
    nav_height: f64,
    click_buttons: bool,
}

impl PreviewConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            html_path: std::env::args()
                .nth(1)
                .or_else(|| std::env::var("PREVIEW_HTML").ok())
                .context("PREVIEW_HTML not set and no HTML file given")?,
            store_path: std::env::var("PREVIEW_STORE")
                .unwrap_or_else(|_| "run-history/preferences.json".to_string()),
            language: std::env::var("PREVIEW_LANG").ok(),
            scroll_y: std::env::var("PREVIEW_SCROLL_Y")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0),
            viewport_height: std::env::var("PREVIEW_VIEWPORT_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900.0),
            section_height: std::env::var("PREVIEW_SECTION_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(640.0),
            nav_height: std::env::var("PREVIEW_NAV_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(72.0),
            click_buttons: std::env::var("PREVIEW_CLICK_BUTTONS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
struct PreviewReport {
    language: String,
    language_name: String,
    translated_elements: usize,
    navbar_scrolled: Option<bool>,
    menu_open: Option<bool>,
    revealed: usize,
    pending: usize,
    cta_events: Vec<CtaEvent>,
}

/// Stack sections vertically below the navbar.
fn lay_out(doc: &mut MemoryDocument, config: &PreviewConfig) {
    if let Some(navbar) = doc.element_by_id("navbar") {
        doc.set_layout(navbar, 0.0, config.nav_height);
    }
    let sections = doc.query_all(&Query::Class("section"));
    for (index, section) in sections.into_iter().enumerate() {
        let top = config.nav_height + index as f64 * config.section_height;
        doc.set_layout(section, top, config.section_height);
    }
}

fn run(site: &mut PreviewSite, config: &PreviewConfig) {
    if let Some(code) = &config.language {
        let option = site
            .language()
            .options()
            .iter()
            .copied()
            .find(|option| site.document().attribute(*option, "data-lang").as_deref() == Some(code));
        match option {
            Some(target) => {
                info!("Clicking language option '{}'", code);
                site.dispatch(PageEvent::Click { target });
            }
            None => info!("No language option for '{}'", code),
        }
    }

    site.document_mut().set_scroll_y(config.scroll_y);
    site.dispatch(PageEvent::Scroll);

    let visible: Vec<Intersection> = site
        .document()
        .observed_in_viewport(config.viewport_height)
        .into_iter()
        .map(|target| Intersection {
            target,
            is_intersecting: true,
        })
        .collect();
    info!("{} watched elements in viewport", visible.len());
    site.dispatch(PageEvent::Intersections(visible));

    if config.click_buttons {
        let buttons = site.analytics().buttons().to_vec();
        for target in buttons {
            site.dispatch(PageEvent::Click { target });
        }
    }
}

fn report(site: &PreviewSite) -> PreviewReport {
    let doc = site.document();
    let lang = site.language().current();
    let translated_elements = doc
        .query_all(&Query::HasAttributes(&["data-en", "data-pt"]))
        .into_iter()
        .filter(|element| doc.attribute(*element, lang.data_attribute()).is_some_and(|t| !t.is_empty()))
        .count();

    PreviewReport {
        language: lang.code().to_string(),
        language_name: lang.native_name().to_string(),
        translated_elements,
        navbar_scrolled: doc
            .element_by_id("navbar")
            .map(|navbar| doc.has_class(navbar, "scrolled")),
        menu_open: site.navigation().map(|nav| nav.is_menu_open(doc)),
        revealed: site.animations().revealed(),
        pending: site.animations().pending(),
        cta_events: site.sink().1.events().to_vec(),
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("appsecdays_site=info".parse()?),
        )
        .init();

    let config = PreviewConfig::from_env()?;
    let site_config = SiteConfig::from_env()?;

    info!("Loading page from {}", config.html_path);
    let html = fs::read_to_string(&config.html_path)
        .with_context(|| format!("Failed to read {}", config.html_path))?;
    let mut doc = MemoryDocument::parse_html(&html);
    lay_out(&mut doc, &config);

    let store = JsonFileStore::open(&config.store_path)
        .with_context(|| format!("Failed to open preference store {}", config.store_path))?;
    let sink = (TracingSink, RecordingSink::new());

    let mut site = Site::init(doc, store, sink, &site_config);
    run(&mut site, &config);

    let report = report(&site);
    println!("{}", serde_json::to_string_pretty(&report)?);
    info!("Preferences stored in {}", site.store().path().display());
    Ok(())
}
