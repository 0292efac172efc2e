//! # robokassa-rs
//!
//! A Rust client SDK for the Robokassa payment gateway.
//!
//! The gateway authenticates every checkout request, callback and web-service
//! query with a control signature: a digest over a fixed, `:`-joined list of
//! transaction fields and one of the shop's two technical passwords. This
//! crate builds those signatures exactly the way the gateway verifies them,
//! creates checkout links, checks incoming callbacks and queries the state
//! of an invoice through the XML web service.
//!
//! ## Features
//!
//! - **Signatures**: checkout, Success callback, Result callback and state query variants
//! - **Checkout links**: `Index.aspx` URLs with receipts, currencies and `Shp_*` parameters
//! - **Callbacks**: parsing and verification of Result/Success notifications
//! - **State queries**: `OpStateExt` over HTTP, parsed into typed values
//! - **Pluggable transport**: bring your own [`loader::XmlLoader`]
//!
//! ## Quick Start
//!
//! ### Checkout link
//!
//! ```rust
//! use robokassa_rs::client::RobokassaClient;
//! use robokassa_rs::types::{HashAlgorithm, PaymentRequest};
//!
//! let client = RobokassaClient::new()
//!     .with_shop_id("demo_shop")
//!     .with_password1("password_1")
//!     .with_password2("password_2")
//!     .with_hash_algorithm(HashAlgorithm::Sha256);
//!
//! let request = PaymentRequest::new("100.00", 42)
//!     .with_description("Order #42")
//!     .with_shop_param("Shp_user", "alice");
//!
//! let url = client.payment_url(&request).unwrap();
//! assert_eq!(url.host_str(), Some("auth.robokassa.kz"));
//! ```
//!
//! ### Result callback
//!
//! ```rust
//! use robokassa_rs::callback::CallbackParams;
//! use robokassa_rs::client::RobokassaClient;
//! use robokassa_rs::types::{CallbackKind, HashAlgorithm};
//!
//! let client = RobokassaClient::new()
//!     .with_password2("password_2")
//!     .with_hash_algorithm(HashAlgorithm::Md5);
//!
//! let signature = client.build_callback_signature("result", "100.00", 42, None).unwrap();
//! let body = format!("OutSum=100.00&InvId=42&SignatureValue={}", signature);
//!
//! let params = CallbackParams::from_query(&body).unwrap();
//! assert!(client.verify_callback(CallbackKind::Result, &params).unwrap());
//! assert_eq!(params.acknowledgement(), "OK42");
//! ```
//!
//! ### State query
//!
//! ```rust,no_run
//! use robokassa_rs::client::RobokassaClient;
//! use robokassa_rs::types::HashAlgorithm;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RobokassaClient::new()
//!     .with_shop_id("demo_shop")
//!     .with_password2("password_2")
//!     .with_hash_algorithm(HashAlgorithm::Md5)
//!     .with_country("ru")?;
//!
//! let state = client.fetch_operation_state(42).await?;
//! if state.is_success() {
//!     println!("status: {:?}", state.status());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Signature casing
//!
//! Checkout and state-query signatures are lowercase hex. Callback
//! signatures are uppercase hex. The gateway compares them as such; do not
//! normalize one into the other.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod callback;
pub mod client;
pub mod errors;
pub mod loader;
pub mod signature;
pub mod state;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use callback::CallbackParams;
pub use client::RobokassaClient;
pub use errors::{Result, RobokassaError};
pub use signature::SignatureBuilder;
pub use state::{OperationStateResponse, PaymentStatus};
pub use types::{
    CallbackKind, Country, Currency, HashAlgorithm, MerchantCredentials, PaymentRequest, Receipt,
    ReceiptItem, ShopData,
};
