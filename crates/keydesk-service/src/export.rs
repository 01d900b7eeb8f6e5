//! License export formatting.
//!
//! Two artifacts: CSV prefixed with a UTF-8 BOM so spreadsheet imports
//! keep non-Latin text intact, and an HTML table served under the Excel
//! MIME type. Both are plain string builders with no I/O.

use chrono::{DateTime, Utc};

use keydesk_entity::license::model::{License, LicenseStatus, parse_expiry};

/// MIME type of the CSV artifact.
pub const CSV_MIME: &str = "text/csv; charset=utf-8";

/// MIME type of the Excel artifact.
pub const EXCEL_MIME: &str = "application/vnd.ms-excel; charset=utf-8";

const HEADERS: [&str; 7] = [
    "Key",
    "User Name",
    "Expires At",
    "HWID",
    "Status",
    "Notes",
    "Created At",
];

/// Renders licenses as CSV with a leading BOM. Every cell is quoted;
/// embedded quotes are doubled.
pub fn to_csv(licenses: &[License], now: DateTime<Utc>) -> String {
    let mut out = String::from("\u{feff}");
    out.push_str(&HEADERS.join(","));
    out.push('\n');

    for (i, license) in licenses.iter().enumerate() {
        let row = row_cells(license, now)
            .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
            .join(",");
        out.push_str(&row);
        if i + 1 < licenses.len() {
            out.push('\n');
        }
    }
    out
}

/// Renders licenses as an HTML table Excel opens natively.
pub fn to_excel_html(licenses: &[License], now: DateTime<Utc>) -> String {
    let mut out = String::from(
        "<html xmlns:o=\"urn:schemas-microsoft-com:office:office\" \
         xmlns:x=\"urn:schemas-microsoft-com:office:excel\">\n<head>\n\
         <meta charset=\"UTF-8\">\n<style>\n\
         table { border-collapse: collapse; }\n\
         th, td { border: 1px solid #000; padding: 8px; }\n\
         th { background-color: #4f46e5; color: white; font-weight: bold; }\n\
         </style>\n</head>\n<body>\n<table>\n<thead>\n<tr>",
    );
    for header in HEADERS {
        out.push_str(&format!("<th>{header}</th>"));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for license in licenses {
        out.push_str("<tr>");
        for cell in row_cells(license, now) {
            out.push_str(&format!("<td>{}</td>", escape_html(&cell)));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}

fn row_cells(license: &License, now: DateTime<Utc>) -> [String; 7] {
    [
        license.key.clone(),
        license.user_name.clone(),
        format_expiry(&license.expires_at),
        license.hwid.clone(),
        status_label(license, now).to_string(),
        license.notes.clone(),
        license
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    ]
}

fn status_label(license: &License, now: DateTime<Utc>) -> &'static str {
    match license.status_at(now) {
        LicenseStatus::Expired => "expired",
        LicenseStatus::Used => "used",
        LicenseStatus::Active => "active",
    }
}

fn format_expiry(raw: &str) -> String {
    match parse_expiry(raw) {
        Some(ts) => ts.format("%Y-%m-%d").to_string(),
        None => raw.trim().to_string(),
    }
}

fn escape_html(cell: &str) -> String {
    cell.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
