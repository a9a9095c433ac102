//! Daily summary adapter

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use scraper::{ElementRef, Html};
use tracing::{debug, warn};
use url::Url;
use xema_core::{clean, DailySummary, DailySummarySource, StationRef};

use crate::html::{cell_text, row_cells, selector};
use crate::{get_text, IngestError, IngestResult};

/// Heading placed right before the summary table
const SUMMARY_HEADING: &str = "Resum diari";

/// Text that identifies the summary table when no heading announces it
const SUMMARY_MARKER: &str = "Temperatura mitjana";

/// Row label on the page and the variable it feeds
pub const DAILY_VARIABLES: &[(&str, &str)] = &[
    ("Temperatura mitjana", "TEMPERATURA_MITJANA_DIA"),
    ("Temperatura màxima", "TEMPERATURA_MAXIMA_DIA"),
    ("Temperatura mínima", "TEMPERATURA_MINIMA_DIA"),
    ("Humitat relativa mitjana", "HUMITAT_MITJANA_DIA"),
    ("Precipitació acumulada", "PRECIPITACIO_ACUM_DIA"),
    ("Gruix de neu màxim", "GRUIX_NEU_MAX"),
    ("Ratxa màxima del vent", "RATXA_VENT_MAX"),
    ("Irradiació solar global", "RADIACIO_GLOBAL"),
    ("Pressió atmosfèrica", "PRESSIO_ATMOSFERICA"),
];

#[derive(Debug, Clone)]
pub struct DailySummaryAdapter {
    client: reqwest::Client,
    base_url: Url,
    query_time: NaiveTime,
}

impl DailySummaryAdapter {
    pub fn new(client: reqwest::Client, base_url: &str, query_time: NaiveTime) -> IngestResult<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            query_time,
        })
    }

    pub fn request_url(&self, station_code: &str, date: NaiveDate) -> Url {
        let dia = format!("{}T{}Z", date.format("%Y-%m-%d"), self.query_time.format("%H:%M"));
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("codi", station_code)
            .append_pair("dia", &dia);
        url
    }

    pub async fn try_fetch(
        &self,
        station: &StationRef,
        date: NaiveDate,
        extracted_at: DateTime<Utc>,
    ) -> IngestResult<DailySummary> {
        let url = self.request_url(&station.code, date);
        let body = get_text(&self.client, &url).await?;
        let values = parse_daily_table(&body)?;
        Ok(DailySummary {
            station_code: station.code.clone(),
            station_name: station.label().to_string(),
            date,
            values,
            source_url: Some(url.to_string()),
            extraction_timestamp: extracted_at,
        })
    }
}

#[async_trait::async_trait]
impl DailySummarySource for DailySummaryAdapter {
    async fn fetch_daily(
        &self,
        station: &StationRef,
        date: NaiveDate,
        extracted_at: DateTime<Utc>,
    ) -> Option<DailySummary> {
        match self.try_fetch(station, date, extracted_at).await {
            Ok(summary) if summary.is_empty() => {
                debug!(station = %station.code, %date, "daily summary empty");
                None
            }
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(station = %station.code, %date, error = %e, "daily summary fetch failed");
                None
            }
        }
    }
}

/// Clean a daily value, fixing the split irradiation unit
fn clean_daily(raw: &str) -> String {
    clean(&raw.replace("MJ/m 2", "MJ/m2"))
}

/// Summary table of a page
///
/// The first table whose nearest preceding heading reads "Resum diari" wins;
/// otherwise the first table mentioning the mean temperature.
fn find_summary_table(document: &Html) -> Option<ElementRef<'_>> {
    let mut heading: Option<String> = None;
    for element in document.select(&selector("h2, h3, strong, b, table")) {
        if element.value().name() != "table" {
            heading = Some(cell_text(element));
        } else if heading.as_deref().is_some_and(|h| h.contains(SUMMARY_HEADING)) {
            return Some(element);
        }
    }

    document
        .select(&selector("table"))
        .find(|t| t.html().contains(SUMMARY_MARKER))
}

/// Extract the nine daily variables from a summary page
///
/// Every variable is present in the result; missing ones are empty.
pub fn parse_daily_table(html: &str) -> IngestResult<BTreeMap<String, String>> {
    let document = Html::parse_document(html);
    let table = find_summary_table(&document).ok_or(IngestError::MissingTable)?;

    let mut values: BTreeMap<String, String> = DAILY_VARIABLES
        .iter()
        .map(|(_, name)| (name.to_string(), String::new()))
        .collect();

    for row in table.select(&selector("tr")) {
        let cells = row_cells(row);
        if cells.len() < 2 {
            continue;
        }
        if let Some((_, name)) = DAILY_VARIABLES.iter().find(|(label, _)| cells[0].contains(label)) {
            values.insert(name.to_string(), clean_daily(&cells[1..].join(" ")));
        }
    }
    Ok(values)
}
