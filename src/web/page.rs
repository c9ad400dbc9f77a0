//! Server-rendered check page: form, verdict and prediction history

use crate::form::{SubmissionForm, DEFAULT_DAY, DEFAULT_HOUR, DEFAULT_MONTH};
use crate::service::Submission;
use crate::types::record::LOG_HEADER;
use crate::types::{Gender, LogRecord};
use std::fmt::Write;

pub const EMPTY_HISTORY_MESSAGE: &str = "No predictions saved yet. Make a prediction first!";

/// Result panel shown above the history
pub enum Outcome {
    Checked(Submission),
    Rejected(String),
    Failed(String),
}

/// History section contents
pub enum HistoryView {
    Records(Vec<LogRecord>),
    Empty,
    Unavailable(String),
}

impl From<anyhow::Result<Option<Vec<LogRecord>>>> for HistoryView {
    fn from(result: anyhow::Result<Option<Vec<LogRecord>>>) -> Self {
        match result {
            Ok(Some(records)) => HistoryView::Records(records),
            Ok(None) => HistoryView::Empty,
            Err(e) => HistoryView::Unavailable(format!("{e:#}")),
        }
    }
}

pub struct PageView<'a> {
    pub form: &'a SubmissionForm,
    pub outcome: Option<Outcome>,
    pub history: HistoryView,
}

/// Escape text for HTML element and attribute content
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str(concat!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n",
        "<title>Fraud Detection System</title>\n",
        "<style>body{font-family:sans-serif;max-width:960px;margin:2em auto}",
        "label{display:block;margin-top:.6em}",
        ".error{color:#b00020}.info{color:#0b5394}.fraud{color:#b00020}.legit{color:#1b7f3b}",
        "table{border-collapse:collapse;font-size:.85em}td,th{border:1px solid #ccc;padding:2px 6px}</style>\n",
        "</head>\n<body>\n<h1>Fraud Detection System</h1>\n",
        "<p>Enter the transaction details below:</p>\n",
    ));

    render_form(&mut html, view.form);

    match &view.outcome {
        Some(Outcome::Checked(submission)) => {
            let class = if submission.verdict.is_fraud() { "fraud" } else { "legit" };
            let _ = writeln!(
                html,
                "<h2 class=\"{class}\">Prediction: {}</h2>",
                escape(submission.verdict.label())
            );
            let _ = writeln!(
                html,
                "<p>Distance between customer and merchant: {:.3} km</p>",
                submission.distance_km
            );
            if !submission.unseen_columns.is_empty() {
                let _ = writeln!(
                    html,
                    "<p class=\"info\">Values not seen during training (encoded as -1): {}</p>",
                    escape(&submission.unseen_columns.join(", "))
                );
            }
        }
        Some(Outcome::Rejected(message)) | Some(Outcome::Failed(message)) => {
            let _ = writeln!(html, "<p class=\"error\">{}</p>", escape(message));
        }
        None => {}
    }

    html.push_str("<hr>\n<h3>Past Predictions Log</h3>\n");
    render_history(&mut html, &view.history);

    html.push_str("</body>\n</html>\n");
    html
}

fn render_form(html: &mut String, form: &SubmissionForm) {
    html.push_str("<form method=\"post\" action=\"/predict\">\n");

    text_input(html, "merchant", "Merchant Name", &form.merchant);
    text_input(html, "category", "Category", &form.category);
    number_input(html, "amt", "Transaction Amount", form.amt, "0.01", Some("0"));
    number_input(html, "lat", "Latitude", form.lat, "0.000001", None);
    number_input(html, "long", "Longitude", form.long, "0.000001", None);
    number_input(html, "merch_lat", "Merchant Latitude", form.merch_lat, "0.000001", None);
    number_input(html, "merch_long", "Merchant Longitude", form.merch_long, "0.000001", None);
    slider(html, "hour", "Transaction Hour", form.hour, DEFAULT_HOUR, 0, 23);
    slider(html, "day", "Transaction Day", form.day, DEFAULT_DAY, 1, 31);
    slider(html, "month", "Transaction Month", form.month, DEFAULT_MONTH, 1, 12);

    html.push_str("<label>Gender <select name=\"gender\">");
    for gender in [Gender::Male, Gender::Female] {
        let selected = if gender == form.gender { " selected" } else { "" };
        let _ = write!(html, "<option value=\"{0}\"{selected}>{0}</option>", gender.as_str());
    }
    html.push_str("</select></label>\n");

    text_input(html, "cc_num", "Credit Card Number", &form.cc_num);

    html.push_str("<p><button type=\"submit\">Check For Fraud</button></p>\n</form>\n");
}

fn text_input(html: &mut String, name: &str, label: &str, value: &str) {
    let _ = writeln!(
        html,
        "<label>{label} <input type=\"text\" name=\"{name}\" value=\"{}\"></label>",
        escape(value)
    );
}

fn number_input(html: &mut String, name: &str, label: &str, value: Option<f64>, step: &str, min: Option<&str>) {
    let value = value.map(|v| v.to_string()).unwrap_or_default();
    let min = min.map(|m| format!(" min=\"{m}\"")).unwrap_or_default();
    let _ = writeln!(
        html,
        "<label>{label} <input type=\"number\" name=\"{name}\" step=\"{step}\"{min} value=\"{value}\"></label>"
    );
}

fn slider(html: &mut String, name: &str, label: &str, value: Option<f64>, default: u8, min: u8, max: u8) {
    let value = value.unwrap_or(f64::from(default));
    let _ = writeln!(
        html,
        "<label>{label} ({min}-{max}) <input type=\"range\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"1\" value=\"{value}\"></label>"
    );
}

fn render_history(html: &mut String, history: &HistoryView) {
    let records = match history {
        HistoryView::Records(records) => records,
        HistoryView::Empty => {
            let _ = writeln!(html, "<p class=\"info\">{EMPTY_HISTORY_MESSAGE}</p>");
            return;
        }
        HistoryView::Unavailable(message) => {
            let _ = writeln!(
                html,
                "<p class=\"error\">Prediction log unavailable: {}</p>",
                escape(message)
            );
            return;
        }
    };

    html.push_str("<table>\n<tr>");
    for column in LOG_HEADER {
        let _ = write!(html, "<th>{column}</th>");
    }
    html.push_str("</tr>\n");

    for record in records {
        let cells = [
            escape(&record.datetime),
            escape(&record.merchant),
            escape(&record.category),
            format!("{:.2}", record.amt),
            format!("{:.3}", record.distance),
            record.hour.to_string(),
            record.day.to_string(),
            record.month.to_string(),
            record.gender.to_string(),
            escape(&record.cc_num),
            record.result.to_string(),
        ];
        html.push_str("<tr>");
        for cell in cells {
            let _ = write!(html, "<td>{cell}</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}
