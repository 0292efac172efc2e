//! Example checkout link.
//!
//! Builds a signed link to the Robokassa payment page, with a fiscal
//! receipt and a couple of `Shp_*` parameters.
//!
//! Run with:
//! ```bash
//! cargo run --example payment_link
//! ```
//!
//! Environment variables (a `.env` file is picked up too):
//! - ROBOKASSA_SHOP_ID: Shop identifier
//! - ROBOKASSA_PASSWORD1: Password #1
//! - ROBOKASSA_HASH_ALGORITHM: Digest algorithm (md5, sha256, ...)
//! - ROBOKASSA_COUNTRY: kz or ru

use robokassa_rs::types::{HashAlgorithm, PaymentRequest, Receipt, ReceiptItem};
use robokassa_rs::RobokassaClient;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut client = RobokassaClient::from_env()?.with_test_mode(true);
    if client.signer.credentials.shop_id.is_none() {
        println!("⚠️  No ROBOKASSA_SHOP_ID set, using demo credentials");
        client = client
            .with_shop_id("demo_shop")
            .with_password1("demo_password_1")
            .with_hash_algorithm(HashAlgorithm::Md5);
    }

    let receipt = Receipt::new().with_sno("osn").with_item(
        ReceiptItem::new("Подписка на месяц", 1.0, 1500.0, "none")
            .with_payment_method("full_payment")
            .with_payment_object("service"),
    );

    let request = PaymentRequest::new("1500.00", 1001)
        .with_description("Monthly subscription")
        .with_currency("KZT")
        .with_culture("ru")
        .with_receipt(receipt)
        .with_shop_param("Shp_user", "alice")
        .with_shop_param("Shp_plan", "monthly");

    let signature = client.build_payment_signature(&request)?;
    let url = client.payment_url(&request)?;

    println!("🔐 Robokassa checkout link");
    println!("   Signature: {}", signature);
    println!("   URL: {}", url);
    Ok(())
}
