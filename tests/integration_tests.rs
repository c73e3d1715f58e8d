//! Integration tests for the AppSec Days site
//!
//! These tests run the composed `Site` against a realistic page parsed from
//! HTML and drive it with page events, the way the browser backend does.

use appsecdays_site::analytics::{NoopSink, RecordingSink};
use appsecdays_site::config::SiteConfig;
use appsecdays_site::dom::{Document, ElementId, Intersection, MemoryDocument, Query};
use appsecdays_site::i18n::Language;
use appsecdays_site::storage::{JsonFileStore, MemoryStore, PreferenceStore};
use appsecdays_site::{EventOutcome, PageEvent, Site};
use tempfile::TempDir;

// ==================== Test Helpers ====================

const PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head><title>OWASP AppSec Days Portugal 2026</title></head>
<body>
  <nav id="navbar" class="navbar">
    <a href="#" class="logo">AppSec Days</a>
    <button id="nav-toggle" class="nav-toggle"><span class="bar"></span></button>
    <ul id="nav-menu" class="nav-menu">
      <li><a href="#about" data-en="About" data-pt="Sobre">About</a></li>
      <li><a href="#sponsors" data-en="Sponsors" data-pt="Patrocinadores">Sponsors</a></li>
    </ul>
    <div id="lang-toggle" class="lang-toggle">
      <button class="lang-option" data-lang="en">EN</button>
      <button class="lang-option" data-lang="pt">PT</button>
    </div>
  </nav>

  <header class="hero">
    <h1 data-en="Application security, together" data-pt="Segurança aplicacional, juntos">Application security, together</h1>
    <a href="https://tickets.example/appsec" class="btn btn-primary">
      Get Tickets
    </a>
  </header>

  <section id="about" class="section">
    <p data-en="Two days in Lisbon" data-pt="">Two days in Lisbon</p>
  </section>

  <section id="sponsors" class="section">
    <div class="tiers-grid">
      <div class="tier-card">Gold</div>
      <div class="tier-card">Silver</div>
      <div class="tier-card">Bronze</div>
    </div>
    <div class="sponsor-benefits">
      <div class="benefit-card">Booth</div>
      <div class="benefit-card">Logo</div>
    </div>
    <a href="#contact" class="btn">Become a Sponsor</a>
  </section>

  <section class="section">
    <div class="speakers-grid"><div class="speaker-card">Speaker</div></div>
    <div class="committee-grid"><div class="committee-member">Member</div></div>
  </section>
</body>
</html>"##;

const NAV_HEIGHT: f64 = 72.0;

/// Parse the page and stack its sections 600px apart below the navbar.
fn document() -> MemoryDocument {
    let mut doc = MemoryDocument::parse_html(PAGE);
    let navbar = doc.element_by_id("navbar").unwrap();
    doc.set_layout(navbar, 0.0, NAV_HEIGHT);
    for (index, section) in doc.query_all(&Query::Class("section")).into_iter().enumerate() {
        doc.set_layout(section, 600.0 * (index as f64 + 1.0), 600.0);
    }
    doc
}

fn site_with(store: MemoryStore) -> Site<MemoryDocument, MemoryStore, RecordingSink> {
    Site::init(document(), store, RecordingSink::new(), &SiteConfig::default())
}

fn by_id<D: Document, S: PreferenceStore, E: appsecdays_site::analytics::EventSink>(
    site: &Site<D, S, E>,
    id: &str,
) -> ElementId {
    site.document().element_by_id(id).unwrap()
}

fn lang_option<S: PreferenceStore, E: appsecdays_site::analytics::EventSink>(
    site: &Site<MemoryDocument, S, E>,
    code: &str,
) -> ElementId {
    site.language()
        .options()
        .iter()
        .copied()
        .find(|option| site.document().attribute(*option, "data-lang").as_deref() == Some(code))
        .unwrap()
}

fn first(site: &Site<MemoryDocument, MemoryStore, RecordingSink>, class: &str) -> ElementId {
    site.document().query_all(&Query::Class(class))[0]
}

fn click(site: &mut Site<MemoryDocument, MemoryStore, RecordingSink>, target: ElementId) -> EventOutcome {
    site.dispatch(PageEvent::Click { target })
}

// ==================== Init Tests ====================

#[test]
fn test_init_renders_default_language() {
    let site = site_with(MemoryStore::new());
    let doc = site.document();

    assert_eq!(site.language().current(), Language::ENGLISH);
    assert_eq!(doc.language(), Some("en"));
    assert!(doc.has_class(lang_option(&site, "en"), "active"));
    assert!(!doc.has_class(lang_option(&site, "pt"), "active"));
}

#[test]
fn test_init_order_produces_all_components() {
    let site = site_with(MemoryStore::new());

    assert!(site.navigation().is_some());
    // 3 sections + 3 tiers + 2 benefits + 1 speaker + 1 committee member
    assert_eq!(site.animations().pending(), 10);
    assert_eq!(site.analytics().buttons().len(), 2);
    assert_eq!(site.document().stylesheets().len(), 1);
}

#[test]
fn test_page_without_navbar_still_initializes() {
    let doc = MemoryDocument::parse_html(
        r#"<html><body><section class="section"><a class="btn" href="/x">Go</a></section></body></html>"#,
    );
    let site = Site::init(doc, MemoryStore::new(), NoopSink, &SiteConfig::default());

    assert!(site.navigation().is_none());
    assert_eq!(site.animations().pending(), 1);
    assert_eq!(site.analytics().buttons().len(), 1);
}

// ==================== Language Tests ====================

#[test]
fn test_language_toggle_end_to_end() {
    let mut site = site_with(MemoryStore::new());
    let pt = lang_option(&site, "pt");

    click(&mut site, pt);

    let doc = site.document();
    let title = doc.query_all(&Query::Tag("h1"))[0];
    let about_text = doc.query_all(&Query::Tag("p"))[0];
    assert_eq!(doc.text_content(title), "Segurança aplicacional, juntos");
    assert_eq!(doc.text_content(about_text), "Two days in Lisbon");
    assert_eq!(doc.language(), Some("pt"));
    assert!(doc.has_class(pt, "active"));
    assert!(!doc.has_class(lang_option(&site, "en"), "active"));
    assert_eq!(site.store().writes(), 1);
    assert_eq!(
        site.store().get("appsecdays-lang").unwrap().as_deref(),
        Some("pt")
    );
}

#[test]
fn test_clicking_current_language_writes_nothing() {
    let mut site = site_with(MemoryStore::new());
    let en = lang_option(&site, "en");

    click(&mut site, en);
    click(&mut site, en);

    assert_eq!(site.store().writes(), 0);
}

#[test]
fn test_invalid_stored_language_falls_back() {
    for stored in ["", "fr", "PT", "en-US", "null"] {
        let site = site_with(MemoryStore::new().with_value("appsecdays-lang", stored));
        assert_eq!(site.language().current(), Language::ENGLISH, "stored = {:?}", stored);
    }
}

#[test]
fn test_preference_survives_reload_with_file_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("preferences.json");

    let store = JsonFileStore::open(&path).unwrap();
    let mut site = Site::init(document(), store, NoopSink, &SiteConfig::default());
    let pt = lang_option(&site, "pt");
    site.dispatch(PageEvent::Click { target: pt });

    let reloaded = Site::init(
        document(),
        JsonFileStore::open(&path).unwrap(),
        NoopSink,
        &SiteConfig::default(),
    );
    assert_eq!(reloaded.language().current(), Language::PORTUGUESE);
    assert_eq!(reloaded.document().language(), Some("pt"));
}

// ==================== Navigation Tests ====================

#[test]
fn test_scroll_events_toggle_navbar_class() {
    let mut site = site_with(MemoryStore::new());
    let navbar = by_id(&site, "navbar");

    for (y, expected) in [(50.0, false), (51.0, true), (2000.0, true), (0.0, false)] {
        site.document_mut().set_scroll_y(y);
        site.dispatch(PageEvent::Scroll);
        assert_eq!(site.document().has_class(navbar, "scrolled"), expected, "y = {}", y);
    }
}

#[test]
fn test_menu_link_closes_menu_and_scrolls() {
    let mut site = site_with(MemoryStore::new());
    let toggle = by_id(&site, "nav-toggle");
    let menu = by_id(&site, "nav-menu");
    let body = site.document().body().unwrap();

    click(&mut site, toggle);
    assert!(site.document().has_class(menu, "active"));
    assert_eq!(site.document().style_property(body, "overflow"), Some("hidden"));

    let sponsors_link = site.document().query_within(menu, &Query::Tag("a"))[1];
    let outcome = click(&mut site, sponsors_link);

    assert_eq!(outcome, EventOutcome::PreventDefault);
    assert!(!site.document().has_class(menu, "active"));
    assert!(!site.document().has_class(toggle, "active"));
    assert_eq!(site.document().style_property(body, "overflow"), None);
    // #sponsors is the second section: top 1200, minus the navbar
    assert_eq!(site.document().smooth_scrolls(), [1200.0 - NAV_HEIGHT]);
}

#[test]
fn test_click_inside_toggle_icon_opens_menu() {
    let mut site = site_with(MemoryStore::new());
    let bar = first(&site, "bar");

    click(&mut site, bar);

    assert!(site.navigation().unwrap().is_menu_open(site.document()));
}

#[test]
fn test_outside_click_closes_menu() {
    let mut site = site_with(MemoryStore::new());
    let toggle = by_id(&site, "nav-toggle");
    let hero = first(&site, "hero");

    click(&mut site, toggle);
    click(&mut site, hero);
    click(&mut site, hero);

    assert!(!site.navigation().unwrap().is_menu_open(site.document()));
    let body = site.document().body().unwrap();
    assert_eq!(site.document().style_property(body, "overflow"), None);
}

#[test]
fn test_anchor_with_missing_target_is_not_intercepted() {
    let mut site = site_with(MemoryStore::new());
    let contact = site
        .document()
        .query_all(&Query::Class("btn"))
        .into_iter()
        .find(|btn| site.document().attribute(*btn, "href").as_deref() == Some("#contact"))
        .unwrap();

    let outcome = click(&mut site, contact);

    assert_eq!(outcome, EventOutcome::Proceed);
    assert!(site.document().smooth_scrolls().is_empty());
    // Still tracked as a CTA
    assert_eq!(site.sink().events()[0].label, "Become a Sponsor");
}

#[test]
fn test_logo_bare_hash_is_not_intercepted() {
    let mut site = site_with(MemoryStore::new());
    let logo = first(&site, "logo");

    assert_eq!(click(&mut site, logo), EventOutcome::Proceed);
    assert!(site.document().smooth_scrolls().is_empty());
}

// ==================== Animation Tests ====================

#[test]
fn test_intersections_reveal_once() {
    let mut site = site_with(MemoryStore::new());
    let about = by_id(&site, "about");
    let entries = vec![Intersection {
        target: about,
        is_intersecting: true,
    }];

    site.dispatch(PageEvent::Intersections(entries.clone()));
    site.dispatch(PageEvent::Intersections(entries));

    assert!(site.document().has_class(about, "animate-in"));
    assert!(!site.document().is_observed(about));
    assert_eq!(site.animations().revealed(), 1);
    assert_eq!(site.animations().pending(), 9);
}

#[test]
fn test_viewport_batch_reveals_visible_elements() {
    let mut site = site_with(MemoryStore::new());
    site.document_mut().set_scroll_y(1000.0);

    let visible: Vec<Intersection> = site
        .document()
        .observed_in_viewport(900.0)
        .into_iter()
        .map(|target| Intersection {
            target,
            is_intersecting: true,
        })
        .collect();
    let count = visible.len();
    site.dispatch(PageEvent::Intersections(visible));

    assert!(count > 0);
    assert_eq!(site.animations().revealed(), count);
    assert_eq!(site.document().observed().len(), 10 - count);
}

#[test]
fn test_page_without_watcher_keeps_content_visible() {
    let doc = document().without_watcher();
    let mut site = Site::init(doc, MemoryStore::new(), RecordingSink::new(), &SiteConfig::default());
    let about = by_id(&site, "about");

    site.dispatch(PageEvent::Intersections(vec![Intersection {
        target: about,
        is_intersecting: true,
    }]));

    let doc = site.document();
    assert!(doc.query_all(&Query::Class("animate-ready")).is_empty());
    assert!(doc.query_all(&Query::Class("animate-in")).is_empty());
    assert_eq!(site.animations().pending(), 0);
    // The other components are unaffected
    assert!(site.navigation().is_some());
    assert_eq!(site.analytics().buttons().len(), 2);
}

#[test]
fn test_stagger_order_on_cards() {
    let site = site_with(MemoryStore::new());
    let doc = site.document();

    let tiers = doc.query_all(&Query::Class("tier-card"));
    let orders: Vec<_> = tiers
        .iter()
        .map(|tier| doc.style_property(*tier, "--animation-order"))
        .collect();
    assert_eq!(orders, vec![Some("0"), Some("1"), Some("2")]);

    let member = doc.query_all(&Query::Class("committee-member"))[0];
    assert_eq!(doc.style_property(member, "--animation-order"), Some("0"));
}

// ==================== Analytics Tests ====================

#[test]
fn test_cta_click_forwards_trimmed_label() {
    let mut site = site_with(MemoryStore::new());
    let tickets = first(&site, "btn-primary");

    assert_eq!(click(&mut site, tickets), EventOutcome::Proceed);

    let events = site.sink().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].category, "CTA");
    assert_eq!(events[0].label, "Get Tickets");
    assert_eq!(events[0].link_url.as_deref(), Some("https://tickets.example/appsec"));
}

#[test]
fn test_cta_click_without_sink_is_silent() {
    let mut site = Site::init(document(), MemoryStore::new(), NoopSink, &SiteConfig::default());
    let tickets = site.document().query_all(&Query::Class("btn"))[0];

    assert_eq!(
        site.dispatch(PageEvent::Click { target: tickets }),
        EventOutcome::Proceed
    );
}

#[test]
fn test_non_button_click_is_not_tracked() {
    let mut site = site_with(MemoryStore::new());
    let hero = first(&site, "hero");

    click(&mut site, hero);

    assert!(site.sink().events().is_empty());
}
