//! Example operation state query.
//!
//! Asks the gateway's XML web service for the state of an invoice.
//!
//! Run with:
//! ```bash
//! cargo run --example state_query -- 1001
//! ```
//!
//! Environment variables (a `.env` file is picked up too):
//! - ROBOKASSA_SHOP_ID: Shop identifier
//! - ROBOKASSA_PASSWORD2: Password #2
//! - ROBOKASSA_HASH_ALGORITHM: Digest algorithm (md5, sha256, ...)
//! - ROBOKASSA_COUNTRY: kz or ru

use robokassa_rs::RobokassaClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let invoice_id: u64 = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "1001".to_string())
        .parse()?;

    let client = RobokassaClient::from_env()?;
    println!("📡 Querying state of invoice {}...", invoice_id);
    println!("   URL: {}", client.state_query_url(invoice_id)?);

    let response = client.fetch_operation_state(invoice_id).await?;

    if !response.is_success() {
        eprintln!(
            "❌ Gateway refused the query: code {} ({})",
            response.result.code,
            response.result.description.as_deref().unwrap_or("no description")
        );
        return Ok(());
    }

    if let Some(state) = &response.state {
        println!("✅ Status: {:?} (code {})", state.status(), state.code);
        if let Some(date) = state.state_date() {
            println!("   Since: {}", date);
        }
    }
    if let Some(info) = &response.info {
        println!(
            "💰 Paid {} via {}",
            info.inc_sum.as_deref().unwrap_or("?"),
            info.inc_curr_label.as_deref().unwrap_or("?")
        );
    }
    if let Some(fields) = &response.user_field {
        for field in &fields.fields {
            println!("   {} = {}", field.name, field.value);
        }
    }

    Ok(())
}
