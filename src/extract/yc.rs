//! Y Combinator company documents
//!
//! Detail pages embed the whole company under `props.company`. We keep a
//! nested [`YcCompany`] document (what the JSON dump stores) and flatten it
//! on export, either one row per company with founder column groups or one
//! row per founder.

use crate::extract::fields::Field;
use crate::output::{FlatRecord, Keyed};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Founder column groups in the per-company export
pub const MAX_FOUNDERS: usize = 5;

const COMPANY_COLUMNS: [&str; 15] = [
    "name",
    "one_liner",
    "website",
    "long_description",
    "mission",
    "batch_name",
    "year_founded",
    "team_size",
    "location",
    "city",
    "country",
    "linkedin",
    "twitter",
    "facebook",
    "crunchbase",
];

const FOUNDER_COLUMNS: [&str; 5] = ["name", "title", "bio", "twitter", "linkedin"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YcCompany {
    pub name: Option<String>,
    pub one_liner: Option<String>,
    pub website: Option<String>,
    pub long_description: Option<String>,
    pub mission: Option<String>,
    pub key_details: KeyDetails,
    pub founders: Vec<Founder>,
    pub latest_news: Vec<NewsItem>,
    pub social_media: SocialMedia,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyDetails {
    pub batch_name: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub year_founded: Option<u64>,
    #[serde(deserialize_with = "lenient_number")]
    pub team_size: Option<u64>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Founder {
    pub full_name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub social_links: SocialLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialMedia {
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub crunchbase: Option<String>,
}

/// Reads a count written as a number or a numeric string
///
/// Older dumps store whatever the directory returned; anything that is not
/// a count reads as `None` rather than failing the record.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Field::of(&value).u64())
}

/// Builds a company document from a detail page's `data-page` payload
pub fn extract_company(data_page: &Value) -> YcCompany {
    let company = Field::of(data_page).path(&["props", "company"]);

    YcCompany {
        name: company.get("name").opt_text(),
        one_liner: company.get("one_liner").opt_text(),
        website: company.get("website").opt_text(),
        long_description: company.get("long_description").opt_text(),
        mission: company.get("mission").opt_text(),
        key_details: KeyDetails {
            batch_name: company.get("batch_name").opt_text(),
            year_founded: company.get("year_founded").u64(),
            team_size: company.get("team_size").u64(),
            location: company.get("location").opt_text(),
            city: company.get("city").opt_text(),
            country: company.get("country").opt_text(),
        },
        founders: company
            .get("founders")
            .items()
            .iter()
            .map(|founder| extract_founder(Field::of(founder)))
            .collect(),
        latest_news: news_items(company.get("newsItems")),
        social_media: SocialMedia {
            linkedin: company.get("linkedin_url").opt_text(),
            twitter: company.get("twitter_url").opt_text(),
            facebook: company.get("fb_url").opt_text(),
            crunchbase: company.get("cb_url").opt_text(),
        },
    }
}

fn extract_founder(founder: Field<'_>) -> Founder {
    Founder {
        full_name: founder.get("full_name").opt_text(),
        title: founder.get("title").opt_text(),
        bio: founder.get("founder_bio").opt_text(),
        social_links: SocialLinks {
            twitter: founder.get("twitter_url").opt_text(),
            linkedin: founder.get("linkedin_url").opt_text(),
        },
    }
}

/// Parses a `newsItems` array
pub fn news_items(field: Field<'_>) -> Vec<NewsItem> {
    field
        .items()
        .iter()
        .map(|news| {
            let news = Field::of(news);
            NewsItem {
                title: news.get("title").opt_text(),
                url: news.get("url").opt_text(),
                date: news.get("date").opt_text(),
            }
        })
        .collect()
}

/// The follow-up news endpoint referenced by a detail page, if any
pub fn news_url(data_page: &Value) -> Option<String> {
    Field::of(data_page)
        .path(&["props", "company", "newsUrl"])
        .opt_text()
}

impl YcCompany {
    /// Appends news items whose URL is not already listed
    ///
    /// Returns the number of items added.
    pub fn merge_news(&mut self, items: Vec<NewsItem>) -> usize {
        let mut added = 0;
        for item in items {
            let duplicate = self.latest_news.iter().any(|known| known.url == item.url);
            if !duplicate {
                self.latest_news.push(item);
                added += 1;
            }
        }
        added
    }

    /// Flattens the company into one row per founder
    pub fn founder_rows(&self) -> Vec<FounderRow> {
        self.founders
            .iter()
            .map(|founder| FounderRow {
                company_name: text(&self.name),
                website: text(&self.website),
                company_linkedin: text(&self.social_media.linkedin),
                founder_name: text(&founder.full_name),
                founder_linkedin: text(&founder.social_links.linkedin),
                founder_twitter: text(&founder.social_links.twitter),
            })
            .collect()
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn number(value: &Option<u64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

impl Keyed for YcCompany {
    fn natural_key(&self) -> String {
        text(&self.website)
    }
}

impl FlatRecord for YcCompany {
    fn columns() -> Vec<String> {
        let mut columns: Vec<String> = COMPANY_COLUMNS.iter().map(|c| c.to_string()).collect();
        for i in 1..=MAX_FOUNDERS {
            for field in FOUNDER_COLUMNS {
                columns.push(format!("founder_{}_{}", i, field));
            }
        }
        columns
    }

    fn values(&self) -> Vec<String> {
        let details = &self.key_details;
        let social = &self.social_media;

        let mut values = vec![
            text(&self.name),
            text(&self.one_liner),
            text(&self.website),
            text(&self.long_description),
            text(&self.mission),
            text(&details.batch_name),
            number(&details.year_founded),
            number(&details.team_size),
            text(&details.location),
            text(&details.city),
            text(&details.country),
            text(&social.linkedin),
            text(&social.twitter),
            text(&social.facebook),
            text(&social.crunchbase),
        ];

        for i in 0..MAX_FOUNDERS {
            match self.founders.get(i) {
                Some(founder) => values.extend([
                    text(&founder.full_name),
                    text(&founder.title),
                    text(&founder.bio),
                    text(&founder.social_links.twitter),
                    text(&founder.social_links.linkedin),
                ]),
                None => values.extend(std::iter::repeat(String::new()).take(FOUNDER_COLUMNS.len())),
            }
        }

        values
    }
}

/// One founder of one company, as exported to the Excel sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FounderRow {
    pub company_name: String,
    pub website: String,
    pub company_linkedin: String,
    pub founder_name: String,
    pub founder_linkedin: String,
    pub founder_twitter: String,
}

impl Keyed for FounderRow {
    fn natural_key(&self) -> String {
        if self.founder_name.is_empty() {
            return String::new();
        }
        format!("{}|{}", self.website, self.founder_name)
    }
}

impl FlatRecord for FounderRow {
    fn columns() -> Vec<String> {
        [
            "Company Name",
            "Website",
            "LinkedIn (Company)",
            "Founder Name",
            "Founder LinkedIn",
            "Founder Twitter",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect()
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.company_name.clone(),
            self.website.clone(),
            self.company_linkedin.clone(),
            self.founder_name.clone(),
            self.founder_linkedin.clone(),
            self.founder_twitter.clone(),
        ]
    }

    fn column_widths() -> &'static [f64] {
        &[30.0, 45.0, 50.0, 25.0, 50.0, 40.0]
    }
}
