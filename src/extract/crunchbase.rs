//! Flattening of Crunchbase API organization items
//!
//! Each API item carries an `organization` object. Relations (founders,
//! investors) arrive as `{items: [...]}` wrappers around entity references.

use crate::extract::fields::{join_labels, Field};
use crate::output::{FlatRecord, Keyed};
use serde_json::Value;

/// Investors kept per organization, in source order
pub const TOP_INVESTORS: usize = 5;

const COLUMNS: [&str; 33] = [
    "Organization Name",
    "Stage",
    "Industries",
    "Headquarters Location",
    "Description",
    "CB Rank (Company)",
    "Investment Stage",
    "Number of Portfolio Organizations",
    "Number of Investments",
    "Number of Lead Investments",
    "Accelerator Program Type",
    "Accelerator Application Deadline",
    "Investor Type",
    "Number of Founders (Alumni)",
    "Number of Alumni",
    "Founders",
    "Number of Employees",
    "Last Funding Date",
    "Last Funding Amount",
    "Last Funding Type",
    "Last Equity Funding Type",
    "Last Equity Funding Amount",
    "Total Funding Amount",
    "Top 5 Investors",
    "Estimated Revenue Range",
    "Operating Status",
    "Founded Date",
    "Company Type",
    "Website",
    "LinkedIn",
    "Contact Email",
    "Phone Number",
    "Full Description",
];

/// One organization flattened to the fixed Crunchbase schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrunchbaseRecord {
    pub organization_name: String,
    pub stage: String,
    pub industries: String,
    pub headquarters_location: String,
    pub description: String,
    pub cb_rank: String,
    pub investment_stage: String,
    pub portfolio_count: String,
    pub investments_count: String,
    pub lead_investments_count: String,
    pub accelerator_program_type: String,
    pub accelerator_application_deadline: String,
    pub investor_type: String,
    pub founder_count: usize,
    pub alumni_count: String,
    pub founders: String,
    pub number_of_employees: String,
    pub last_funding_date: String,
    pub last_funding_amount: String,
    pub last_funding_type: String,
    pub last_equity_funding_type: String,
    pub last_equity_funding_amount: String,
    pub total_funding_amount: String,
    pub top_investors: String,
    pub estimated_revenue_range: String,
    pub operating_status: String,
    pub founded_date: String,
    pub company_type: String,
    pub website: String,
    pub linkedin: String,
    pub contact_email: String,
    pub phone_number: String,
    pub full_description: String,
}

/// Flattens one API item; never fails, absent fields become empty
pub fn extract_organization(item: &Value) -> CrunchbaseRecord {
    let org = Field::of(item).get("organization");

    let top_investors: Vec<String> = org
        .path(&["investors", "items"])
        .items()
        .iter()
        .take(TOP_INVESTORS)
        .filter_map(|investor| Field::of(investor).path(&["investor", "name"]).opt_text())
        .collect();

    let founders: Vec<String> = org
        .path(&["founders", "items"])
        .items()
        .iter()
        .filter_map(|founder| Field::of(founder).path(&["founder", "name"]).opt_text())
        .collect();

    CrunchbaseRecord {
        organization_name: org.get("name").text(),
        stage: org.get("stage").text(),
        industries: join_labels(&org.get("categories").labels()),
        headquarters_location: org.path(&["headquarters", "region"]).text(),
        description: org.get("short_description").text(),
        cb_rank: org.get("cb_rank").text(),
        investment_stage: org.get("investment_stage").text(),
        portfolio_count: org.get("portfolio_count").text(),
        investments_count: org.get("investments_count").text(),
        lead_investments_count: org.get("lead_investments_count").text(),
        accelerator_program_type: org.get("accelerator_program_type").text(),
        accelerator_application_deadline: org.get("accelerator_application_deadline").text(),
        investor_type: org.get("investor_type").text(),
        founder_count: founders.len(),
        alumni_count: org.get("alumni_count").text(),
        founders: join_labels(&founders),
        number_of_employees: org.get("number_of_employees").text(),
        last_funding_date: org.get("last_funding_date").text(),
        last_funding_amount: org.get("last_funding_amount").text(),
        last_funding_type: org.get("last_funding_type").text(),
        last_equity_funding_type: org.get("last_equity_funding_type").text(),
        last_equity_funding_amount: org.get("last_equity_funding_amount").text(),
        total_funding_amount: org.get("total_funding_amount").text(),
        top_investors: join_labels(&top_investors),
        estimated_revenue_range: org.get("estimated_revenue_range").text(),
        operating_status: org.get("operating_status").text(),
        founded_date: org.get("founded_date").text(),
        company_type: org.get("company_type").text(),
        website: org.get("homepage_url").text(),
        linkedin: org.get("linkedin_url").text(),
        contact_email: org.get("contact_email").text(),
        phone_number: org.get("phone_number").text(),
        full_description: org.get("full_description").text(),
    }
}

impl Keyed for CrunchbaseRecord {
    fn natural_key(&self) -> String {
        self.organization_name.clone()
    }
}

impl FlatRecord for CrunchbaseRecord {
    fn columns() -> Vec<String> {
        COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.organization_name.clone(),
            self.stage.clone(),
            self.industries.clone(),
            self.headquarters_location.clone(),
            self.description.clone(),
            self.cb_rank.clone(),
            self.investment_stage.clone(),
            self.portfolio_count.clone(),
            self.investments_count.clone(),
            self.lead_investments_count.clone(),
            self.accelerator_program_type.clone(),
            self.accelerator_application_deadline.clone(),
            self.investor_type.clone(),
            self.founder_count.to_string(),
            self.alumni_count.clone(),
            self.founders.clone(),
            self.number_of_employees.clone(),
            self.last_funding_date.clone(),
            self.last_funding_amount.clone(),
            self.last_funding_type.clone(),
            self.last_equity_funding_type.clone(),
            self.last_equity_funding_amount.clone(),
            self.total_funding_amount.clone(),
            self.top_investors.clone(),
            self.estimated_revenue_range.clone(),
            self.operating_status.clone(),
            self.founded_date.clone(),
            self.company_type.clone(),
            self.website.clone(),
            self.linkedin.clone(),
            self.contact_email.clone(),
            self.phone_number.clone(),
            self.full_description.clone(),
        ]
    }

    fn date_columns() -> &'static [&'static str] {
        &["Last Funding Date", "Founded Date"]
    }
}
