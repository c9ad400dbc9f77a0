//! Sample Transaction Submitter
//!
//! Generates random transactions and submits them to a running fraud check
//! server through the JSON API.

use fraud_check::form::SubmissionForm;
use fraud_check::types::Gender;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const MERCHANTS: &[&str] = &[
    "fraud_Kirlin and Sons",
    "fraud_Sporer-Keebler",
    "fraud_Haley Group",
    "fraud_Johnston-Casper",
    "fraud_Rutherford-Mertz",
];
const EVERYDAY_CATEGORIES: &[&str] = &["grocery_pos", "gas_transport", "food_dining", "home"];
const RISKY_CATEGORIES: &[&str] = &["shopping_net", "misc_net", "grocery_net"];

/// Subset of the API response the submitter reports on
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    verdict: String,
    distance_km: f64,
    unseen_columns: Vec<String>,
}

/// Transaction generator for exercising the service
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Daytime purchase close to home
    fn generate_legitimate(&mut self) -> SubmissionForm {
        let (lat, long) = self.home();
        SubmissionForm {
            merchant: self.random_choice(MERCHANTS).to_string(),
            category: self.random_choice(EVERYDAY_CATEGORIES).to_string(),
            amt: Some((self.rng.gen_range(5.0..150.0_f64) * 100.0).round() / 100.0),
            lat: Some(lat),
            long: Some(long),
            merch_lat: Some(lat + self.rng.gen_range(-0.3..0.3)),
            merch_long: Some(long + self.rng.gen_range(-0.3..0.3)),
            hour: Some(f64::from(self.rng.gen_range(8u8..21))),
            day: Some(f64::from(self.rng.gen_range(1u8..29))),
            month: Some(f64::from(self.rng.gen_range(1u8..13))),
            gender: self.gender(),
            cc_num: self.card_number(),
        }
    }

    /// Large online purchase at night, far from home
    fn generate_suspicious(&mut self) -> SubmissionForm {
        let (lat, long) = self.home();
        SubmissionForm {
            merchant: self.random_choice(MERCHANTS).to_string(),
            category: self.random_choice(RISKY_CATEGORIES).to_string(),
            amt: Some((self.rng.gen_range(500.0..2500.0_f64) * 100.0).round() / 100.0),
            lat: Some(lat),
            long: Some(long),
            merch_lat: Some(self.rng.gen_range(-60.0..70.0)),
            merch_long: Some(self.rng.gen_range(-180.0..180.0)),
            hour: Some(f64::from(self.rng.gen_range(0u8..4))),
            day: Some(f64::from(self.rng.gen_range(1u8..29))),
            month: Some(f64::from(self.rng.gen_range(1u8..13))),
            gender: self.gender(),
            cc_num: self.card_number(),
        }
    }

    /// Somewhere in the continental US
    fn home(&mut self) -> (f64, f64) {
        (self.rng.gen_range(25.0..49.0), self.rng.gen_range(-124.0..-67.0))
    }

    fn gender(&mut self) -> Gender {
        if self.rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    fn card_number(&mut self) -> String {
        format!("4{:015}", self.rng.gen_range(0..1_000_000_000_000_000u64))
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_submitter=info".parse()?),
        )
        .init();

    info!("Starting Sample Transaction Submitter");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args.get(1).map(|s| s.as_str()).unwrap_or("http://127.0.0.1:8501");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let fraud_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(250);

    info!(
        base_url = %base_url,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let endpoint = format!("{}/api/predict", base_url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    let mut suspicious_count = 0;
    let mut flagged_count = 0;
    let mut failed_count = 0;

    for i in 0..count {
        let suspicious = rng.gen_bool(fraud_rate.clamp(0.0, 1.0));
        let form = if suspicious {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let response = client.post(&endpoint).json(&form).send().await;
        match response {
            Ok(resp) if resp.status().is_success() => {
                let body: SubmitResponse = resp.json().await?;
                if body.verdict.starts_with("Fraudulent") {
                    flagged_count += 1;
                }
                info!(
                    n = i + 1,
                    suspicious,
                    amt = form.amt.unwrap_or_default(),
                    distance_km = format!("{:.1}", body.distance_km),
                    verdict = %body.verdict,
                    unseen = ?body.unseen_columns,
                    "Submitted"
                );
            }
            Ok(resp) => {
                failed_count += 1;
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                warn!(n = i + 1, %status, body = %text, "Submission rejected");
            }
            Err(e) => {
                failed_count += 1;
                warn!(n = i + 1, error = %e, "Request failed");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Submitted {} transactions ({} suspicious, {} flagged, {} failed)",
        count, suspicious_count, flagged_count, failed_count
    );

    Ok(())
}
