#![allow(dead_code)]

use std::path::{Path, PathBuf};

use churnkit::config::{PathSettings, Settings};

pub const HEADER: &str = "customerID,gender,SeniorCitizen,Partner,tenure,Contract,PaymentMethod,MonthlyCharges,TotalCharges,Churn";

/// Deterministic Telco-shaped CSV. Month-to-month customers with short
/// tenure churn, plus a sprinkle of label noise. Rows with zero tenure have
/// a blank `TotalCharges`.
pub fn churn_csv(rows: usize) -> String {
    let contracts = ["Month-to-month", "One year", "Two year"];
    let payments = ["Electronic check", "Mailed check", "Bank transfer (automatic)"];
    let mut out = String::from(HEADER);
    out.push('\n');
    for i in 0..rows {
        let tenure = (i * 7) % 72;
        let contract = contracts[i % 3];
        let payment = payments[(i / 3) % 3];
        let gender = if i % 2 == 0 { "Female" } else { "Male" };
        let partner = if i % 5 < 2 { "Yes" } else { "No" };
        let senior = u8::from(i % 6 == 0);
        let monthly = 20.25 + ((i * 13) % 90) as f64;
        let total = if tenure == 0 {
            " ".to_string()
        } else {
            format!("{:.2}", monthly * tenure as f64)
        };
        let churn = (contract == "Month-to-month" && tenure < 30) || i % 17 == 0;
        out.push_str(&format!(
            "{i:04}-TEST,{gender},{senior},{partner},{tenure},{contract},\"{payment}\",{monthly:.2},{total},{}\n",
            if churn { "Yes" } else { "No" }
        ));
    }
    out
}

/// Settings rooted at `root` with the CSV written to `root/data.csv`.
pub fn settings_with_dataset(root: &Path, csv: &str) -> Settings {
    let dataset = root.join("data.csv");
    std::fs::write(&dataset, csv).expect("write dataset");
    Settings {
        paths: PathSettings {
            dataset,
            models_dir: root.join("models"),
            artifacts_dir: root.join("artifacts"),
        },
        ..Settings::default()
    }
}

pub fn models_dir(root: &Path) -> PathBuf {
    root.join("models")
}

/// A complete request body for one customer.
pub fn customer_body(model: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "gender": "Female",
        "SeniorCitizen": 0,
        "Partner": "No",
        "tenure": 3,
        "Contract": "Month-to-month",
        "PaymentMethod": "Electronic check",
        "MonthlyCharges": 85.5,
        "TotalCharges": "256.5"
    });
    if let Some(model) = model {
        body["_model"] = serde_json::Value::String(model.to_string());
    }
    body
}
