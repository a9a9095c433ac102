//! Period table adapter

use scraper::Html;
use tracing::{debug, warn};
use url::Url;
use xema_core::{is_period_label, normalize_header, ObservationWindow, PeriodSource, RawRow};

use crate::html::{cell_text, row_cells, selector};
use crate::{get_text, IngestError, IngestResult};

/// HTTP adapter for `GET <base>?codi=<code>&dia=<YYYY-MM-DD>T<HH:MM>Z`
#[derive(Debug, Clone)]
pub struct MeteocatSource {
    client: reqwest::Client,
    base_url: Url,
}

impl MeteocatSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> IngestResult<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn request_url(&self, window: &ObservationWindow) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("codi", &window.station_code)
            .append_pair("dia", &window.query_value());
        url
    }

    pub async fn try_fetch(&self, window: &ObservationWindow) -> IngestResult<Vec<RawRow>> {
        let url = self.request_url(window);
        let body = get_text(&self.client, &url).await?;
        parse_period_table(&body)
    }
}

#[async_trait::async_trait]
impl PeriodSource for MeteocatSource {
    async fn fetch(&self, window: &ObservationWindow) -> Vec<RawRow> {
        match self.try_fetch(window).await {
            Ok(rows) => {
                debug!(
                    station = %window.station_code,
                    dia = %window.query_value(),
                    rows = rows.len(),
                    "period table fetched"
                );
                rows
            }
            Err(e) => {
                warn!(
                    station = %window.station_code,
                    dia = %window.query_value(),
                    error = %e,
                    "period fetch failed"
                );
                Vec::new()
            }
        }
    }

    fn describe(&self, window: &ObservationWindow) -> Option<String> {
        Some(self.request_url(window).to_string())
    }
}

/// Parse the `table.tblperiode` of a period page
///
/// The first row's `th` cells name the columns; cell `i` of every body row is
/// named by header `i`. Rows are returned most recent first, and rows whose
/// first cell is not an `HH:MM - HH:MM` interval are dropped.
pub fn parse_period_table(html: &str) -> IngestResult<Vec<RawRow>> {
    let document = Html::parse_document(html);
    let table = document
        .select(&selector("table.tblperiode"))
        .next()
        .ok_or(IngestError::MissingTable)?;

    let rows: Vec<_> = table.select(&selector("tr")).collect();
    let header_row = rows.first().ok_or(IngestError::MissingTable)?;
    let headers: Vec<String> = header_row
        .select(&selector("th"))
        .map(cell_text)
        .map(|text| normalize_header(&text))
        .collect();
    if headers.is_empty() {
        return Err(IngestError::MissingHeaders);
    }

    let mut parsed = Vec::new();
    for row in rows.iter().skip(1).rev() {
        let cells = row_cells(*row);
        if cells.len() < 2 || !is_period_label(&cells[0]) {
            continue;
        }

        let readings = headers
            .iter()
            .zip(cells.iter())
            .skip(1)
            .map(|(name, raw)| (name.clone(), raw.clone()))
            .collect();
        parsed.push(RawRow {
            period_label: cells[0].clone(),
            readings,
        });
    }
    Ok(parsed)
}
