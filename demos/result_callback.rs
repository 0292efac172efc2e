//! Example Result URL handler.
//!
//! Verifies a Result callback body the way a shop's notification endpoint
//! would, and prints the acknowledgement to send back.
//!
//! Run with:
//! ```bash
//! cargo run --example result_callback -- "OutSum=100.00&InvId=42&SignatureValue=..."
//! ```

use robokassa_rs::types::{CallbackKind, HashAlgorithm};
use robokassa_rs::{CallbackParams, RobokassaClient};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut client = RobokassaClient::from_env()?;
    if client.signer.credentials.password2.is_none() {
        println!("⚠️  No ROBOKASSA_PASSWORD2 set, using demo credentials");
        client = client
            .with_password2("demo_password_2")
            .with_hash_algorithm(HashAlgorithm::Md5);
    }

    let body = match std::env::args().nth(1) {
        Some(body) => body,
        None => {
            // Simulate the gateway
            let signature = client.build_callback_signature("result", "100.00", 42, None)?;
            format!("OutSum=100.00&InvId=42&SignatureValue={}", signature)
        }
    };

    let params = CallbackParams::from_query(&body)?;
    if client.verify_callback(CallbackKind::Result, &params)? {
        println!("✅ Signature valid, answering: {}", params.acknowledgement());
    } else {
        println!("❌ Signature mismatch for invoice {}", params.inv_id);
    }
    Ok(())
}
