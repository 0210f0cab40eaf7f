//! Record extraction
//!
//! This module turns raw source payloads into flat records:
//! - Crunchbase API items ([`CrunchbaseRecord`])
//! - Y Combinator company pages ([`YcCompany`], [`FounderRow`])
//! - Rendered Crunchbase profile pages ([`ProfileRecord`])
//!
//! Extractors never fail on missing data; absent fields become empty values.

mod crunchbase;
pub mod fields;
mod profile;
mod yc;

pub use crunchbase::{extract_organization, CrunchbaseRecord, TOP_INVESTORS};
pub use fields::{join_labels, Field};
pub use profile::{extract_profile, ProfileRecord, READY_SELECTOR};
pub use yc::{
    extract_company, news_items, news_url, Founder, FounderRow, KeyDetails, NewsItem,
    SocialLinks, SocialMedia, YcCompany, MAX_FOUNDERS,
};
