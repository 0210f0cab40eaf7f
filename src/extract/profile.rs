//! Extraction from rendered Crunchbase organization profiles
//!
//! Profile pages are rendered client-side, so this module only sees the
//! final DOM text handed over by a [`PageRenderer`](crate::crawler::PageRenderer).
//! Values are located three ways:
//! - **class selectors** for fields with a dedicated formatter class
//! - **section ids** for relation lists (`#founders`, `#investors`, ...)
//! - **label lookup**: the first value element that follows a `<span>`
//!   whose text equals the label, in document order
//!
//! All of this depends on the page markup; a selector that stops matching
//! yields an empty field, never an error.

use crate::output::{FlatRecord, Keyed};
use scraper::{ElementRef, Html, Selector};

const COLUMNS: [&str; 22] = [
    "Name",
    "Description",
    "Funding",
    "Location",
    "Industry",
    "Stage",
    "Founding Date",
    "Website",
    "Number of Employees",
    "Headquarters Address",
    "Founders",
    "Key Executives",
    "Investors",
    "Acquisitions",
    "Products",
    "Competitors",
    "Revenue",
    "Last Funding Date",
    "Total Funding Amount",
    "Social Media Profiles",
    "Company Type",
    "Stock Exchange Listing",
];

/// CSS selector that signals a profile page finished rendering
pub const READY_SELECTOR: &str = "h1.profile-name";

const FIELD: &str = "span.component--field-formatter";

/// One rendered profile flattened to the fixed schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileRecord {
    pub name: String,
    pub description: String,
    pub funding: String,
    pub location: String,
    pub industry: String,
    pub stage: String,
    pub founding_date: String,
    pub website: String,
    pub number_of_employees: String,
    pub headquarters_address: String,
    pub founders: String,
    pub key_executives: String,
    pub investors: String,
    pub acquisitions: String,
    pub products: String,
    pub competitors: String,
    pub revenue: String,
    pub last_funding_date: String,
    pub total_funding_amount: String,
    pub social_media_profiles: String,
    pub company_type: String,
    pub stock_exchange_listing: String,
}

/// Extracts a profile from rendered HTML; never fails
pub fn extract_profile(html: &str) -> ProfileRecord {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut record = ProfileRecord {
        name: first_text(root, READY_SELECTOR),
        description: first_text(root, &format!("{}.field-type-text_long", FIELD)),
        location: first_text(root, &format!("{}.field-type-identifier-multi", FIELD)),
        funding: first_text(root, "a.cb-link.component--field-formatter.field-type-money"),
        website: first_attr(root, "a.component--field-formatter.field-type-url", "href"),
        number_of_employees: labelled_value(
            root,
            "Number of Employees",
            &format!("{}.field-type-enum", FIELD),
        ),
        headquarters_address: labelled_value(
            root,
            "Headquarters Address",
            &format!("{}.field-type-address", FIELD),
        ),
        founders: section_links(root, "founders"),
        key_executives: section_links(root, "executives"),
        investors: section_links(root, "investors"),
        acquisitions: section_links(root, "acquisitions"),
        products: section_links(root, "products"),
        competitors: section_links(root, "competitors"),
        revenue: labelled_value(root, "Revenue", &format!("{}.field-type-money", FIELD)),
        last_funding_date: labelled_value(
            root,
            "Last Funding Date",
            &format!("{}.field-type-date", FIELD),
        ),
        total_funding_amount: labelled_value(
            root,
            "Total Funding Amount",
            &format!("{}.field-type-money", FIELD),
        ),
        social_media_profiles: all_attrs(root, "div.social-media-links a.social-link", "href")
            .join(", "),
        company_type: labelled_value(root, "Company Type", &format!("{}.field-type-enum", FIELD)),
        stock_exchange_listing: labelled_value(
            root,
            "Stock Exchange Listing",
            &format!("{}.field-type-enum", FIELD),
        ),
        ..Default::default()
    };

    // Overview strip: industry, founding date and funding stage
    if let Some(overview) = first(root, "div.layout-wrap.layout-row") {
        record.industry = identifier_list(overview, "identifier-multi-formatter");
        record.founding_date =
            first_text(overview, &format!("{}.field-type-date_precision", FIELD));
        record.stage = nth(overview, &format!("{}.field-type-enum", FIELD), 1)
            .and_then(|element| element.value().attr("title"))
            .map(|title| title.trim().to_string())
            .unwrap_or_default();
    }

    record
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!(selector = css, error = ?e, "Invalid selector");
            None
        }
    }
}

/// Whitespace-normalized text content of an element
///
/// Text nodes are concatenated as they appear, so punctuation between
/// inline children stays attached: `<a>Robotics</a>, <a>AI</a>` reads as
/// `Robotics, AI`.
fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Linked labels inside a multi-identifier element, joined with ", "
///
/// Falls back to the element's text when it carries no links.
fn identifier_list(scope: ElementRef<'_>, css: &str) -> String {
    let element = match first(scope, css) {
        Some(element) => element,
        None => return String::new(),
    };

    let labels: Vec<String> = match parse_selector("a") {
        Some(anchor) => element
            .select(&anchor)
            .map(element_text)
            .filter(|label| !label.is_empty())
            .collect(),
        None => Vec::new(),
    };

    if labels.is_empty() {
        element_text(element)
    } else {
        labels.join(", ")
    }
}

fn nth<'a>(scope: ElementRef<'a>, css: &str, index: usize) -> Option<ElementRef<'a>> {
    let selector = parse_selector(css)?;
    let found = scope.select(&selector).nth(index);
    found
}

fn first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    nth(scope, css, 0)
}

fn first_text(scope: ElementRef<'_>, css: &str) -> String {
    first(scope, css).map(element_text).unwrap_or_default()
}

fn first_attr(scope: ElementRef<'_>, css: &str, attr: &str) -> String {
    first(scope, css)
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn all_attrs(scope: ElementRef<'_>, css: &str, attr: &str) -> Vec<String> {
    match parse_selector(css) {
        Some(selector) => scope
            .select(&selector)
            .map(|element| element.value().attr(attr).unwrap_or("").trim().to_string())
            .collect(),
        None => Vec::new(),
    }
}

/// Names linked from a relation section, joined with ", "
fn section_links(scope: ElementRef<'_>, section_id: &str) -> String {
    let css = format!("section#{} a.cb-link", section_id);
    match parse_selector(&css) {
        Some(selector) => scope
            .select(&selector)
            .map(element_text)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        None => String::new(),
    }
}

/// Text of the first `value_css` element after the `<span>` labelled `label`
fn labelled_value(scope: ElementRef<'_>, label: &str, value_css: &str) -> String {
    let selector = match parse_selector(value_css) {
        Some(selector) => selector,
        None => return String::new(),
    };

    let mut past_label = false;
    for node in scope.descendants() {
        let element = match ElementRef::wrap(node) {
            Some(element) => element,
            None => continue,
        };

        if !past_label {
            past_label = element.value().name() == "span" && element_text(element) == label;
            continue;
        }

        if selector.matches(&element) {
            return element_text(element);
        }
    }

    String::new()
}

impl Keyed for ProfileRecord {
    fn natural_key(&self) -> String {
        self.name.clone()
    }
}

impl FlatRecord for ProfileRecord {
    fn columns() -> Vec<String> {
        COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.description.clone(),
            self.funding.clone(),
            self.location.clone(),
            self.industry.clone(),
            self.stage.clone(),
            self.founding_date.clone(),
            self.website.clone(),
            self.number_of_employees.clone(),
            self.headquarters_address.clone(),
            self.founders.clone(),
            self.key_executives.clone(),
            self.investors.clone(),
            self.acquisitions.clone(),
            self.products.clone(),
            self.competitors.clone(),
            self.revenue.clone(),
            self.last_funding_date.clone(),
            self.total_funding_amount.clone(),
            self.social_media_profiles.clone(),
            self.company_type.clone(),
            self.stock_exchange_listing.clone(),
        ]
    }

    fn date_columns() -> &'static [&'static str] {
        &["Founding Date", "Last Funding Date"]
    }
}
