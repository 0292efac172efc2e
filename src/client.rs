//! Merchant-side client for the Robokassa gateway.
//!
//! [`RobokassaClient`] carries the shop configuration and exposes the
//! operations a shop needs: checkout links, callback signatures and the
//! operation state query.

use crate::callback::CallbackParams;
use crate::errors::{Result, RobokassaError};
use crate::loader::{HttpXmlLoader, XmlLoader};
use crate::signature::SignatureBuilder;
use crate::state::{parse_operation_state, OperationStateResponse};
use crate::types::{CallbackKind, Country, HashAlgorithm, PaymentRequest, ShopData};
use crate::utils::encode_receipt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Host of the gateway without its country top-level domain.
pub const DEFAULT_AUTH_HOST: &str = "auth.robokassa";

/// Path of the checkout page.
pub const CHECKOUT_PATH: &str = "/Merchant/Index.aspx";

/// Path of the XML web service.
pub const WEB_SERVICE_PATH: &str = "/Merchant/WebService/Service.asmx";

/// Operation of the web service that reports an invoice's state.
pub const OP_STATE_EXT: &str = "OpStateExt";

/// Configuration and operations of one Robokassa shop.
///
/// # Examples
///
/// ```
/// use robokassa_rs::client::RobokassaClient;
/// use robokassa_rs::types::HashAlgorithm;
///
/// let client = RobokassaClient::new()
///     .with_shop_id("demo_shop")
///     .with_password1("p1")
///     .with_password2("p2")
///     .with_hash_algorithm(HashAlgorithm::Sha256)
///     .with_country("ru")
///     .unwrap();
///
/// let url = client.state_query_url(42).unwrap();
/// assert_eq!(url.host_str(), Some("auth.robokassa.ru"));
/// ```
#[derive(Clone)]
pub struct RobokassaClient {
    /// Credentials and digest algorithm
    pub signer: SignatureBuilder,

    /// Country selecting the gateway's top-level domain
    pub country: Country,

    /// Gateway host without the top-level domain
    pub auth_host: String,

    /// Whether checkout links are created in test mode
    pub test_mode: bool,

    loader: Arc<dyn XmlLoader>,
}

impl Default for RobokassaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RobokassaClient {
    /// Creates an unconfigured client talking to the default host.
    pub fn new() -> Self {
        Self {
            signer: SignatureBuilder::default(),
            country: Country::default(),
            auth_host: DEFAULT_AUTH_HOST.to_string(),
            test_mode: false,
            loader: Arc::new(HttpXmlLoader::new()),
        }
    }

    /// Builds a client from `ROBOKASSA_*` environment variables.
    ///
    /// Reads `ROBOKASSA_SHOP_ID`, `ROBOKASSA_PASSWORD1`,
    /// `ROBOKASSA_PASSWORD2`, `ROBOKASSA_HASH_ALGORITHM`, `ROBOKASSA_COUNTRY`
    /// and `ROBOKASSA_TEST_MODE` (`1`/`true`/`yes`/`on` or
    /// `0`/`false`/`no`/`off`). Unset variables leave the corresponding
    /// setting unset; invalid values fail with
    /// [`RobokassaError::InvalidArgument`](crate::errors::RobokassaError::InvalidArgument).
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut client = Self::new();

        if let Some(shop_id) = var("ROBOKASSA_SHOP_ID") {
            client = client.with_shop_id(shop_id);
        }
        if let Some(password1) = var("ROBOKASSA_PASSWORD1") {
            client = client.with_password1(password1);
        }
        if let Some(password2) = var("ROBOKASSA_PASSWORD2") {
            client = client.with_password2(password2);
        }
        if let Some(algorithm) = var("ROBOKASSA_HASH_ALGORITHM") {
            client = client.with_hash_algorithm(algorithm.parse()?);
        }
        if let Some(country) = var("ROBOKASSA_COUNTRY") {
            client = client.with_country(&country)?;
        }
        if let Some(test_mode) = var("ROBOKASSA_TEST_MODE") {
            client = client.with_test_mode(parse_flag("ROBOKASSA_TEST_MODE", &test_mode)?);
        }

        Ok(client)
    }

    /// Sets the shop identifier.
    pub fn with_shop_id(mut self, shop_id: impl Into<String>) -> Self {
        self.signer.credentials.shop_id = Some(shop_id.into());
        self
    }

    /// Sets password #1.
    pub fn with_password1(mut self, password: impl Into<String>) -> Self {
        self.signer.credentials.password1 = Some(password.into());
        self
    }

    /// Sets password #2.
    pub fn with_password2(mut self, password: impl Into<String>) -> Self {
        self.signer.credentials.password2 = Some(password.into());
        self
    }

    /// Sets the digest algorithm.
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.signer.algorithm = Some(algorithm);
        self
    }

    /// Selects the gateway country by code (`kz` or `ru`, any case).
    ///
    /// # Errors
    ///
    /// [`RobokassaError::InvalidArgument`](crate::errors::RobokassaError::InvalidArgument)
    /// for any other code.
    pub fn with_country(mut self, country: &str) -> Result<Self> {
        self.country = country.parse()?;
        Ok(self)
    }

    /// Overrides the gateway host (without top-level domain).
    pub fn with_auth_host(mut self, host: impl Into<String>) -> Self {
        self.auth_host = host.into();
        self
    }

    /// Enables or disables test mode for checkout links.
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Replaces the XML loader used by [`fetch_operation_state`](Self::fetch_operation_state).
    pub fn with_loader(mut self, loader: impl XmlLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Root URL of the gateway for the configured country.
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!(
            "https://{}.{}/",
            self.auth_host,
            self.country.tld()
        ))?)
    }

    /// Checkout signature of `request`; lowercase hex.
    pub fn build_payment_signature(&self, request: &PaymentRequest) -> Result<String> {
        self.signer.build_payment_signature(request)
    }

    /// Callback signature; uppercase hex. See
    /// [`SignatureBuilder::build_callback_signature`].
    pub fn build_callback_signature(
        &self,
        kind: &str,
        amount: &str,
        invoice_id: u64,
        shop_data: Option<&ShopData>,
    ) -> Result<String> {
        self.signer
            .build_callback_signature(kind, amount, invoice_id, shop_data)
    }

    /// Checks the signature of a callback received from the gateway.
    ///
    /// Result callbacks are checked against password #2, Success redirects
    /// against password #1.
    pub fn verify_callback(&self, kind: CallbackKind, params: &CallbackParams) -> Result<bool> {
        self.signer.verify_callback_signature(
            kind,
            &params.out_sum,
            params.inv_id,
            Some(&params.shop_data),
            &params.signature,
        )
    }

    /// Link to the checkout page for `request`.
    ///
    /// # Examples
    ///
    /// ```
    /// use robokassa_rs::client::RobokassaClient;
    /// use robokassa_rs::types::{HashAlgorithm, PaymentRequest};
    ///
    /// let client = RobokassaClient::new()
    ///     .with_shop_id("demo_shop")
    ///     .with_password1("p1")
    ///     .with_hash_algorithm(HashAlgorithm::Md5);
    ///
    /// let request = PaymentRequest::new("100.00", 42).with_description("Order 42");
    /// let url = client.payment_url(&request).unwrap();
    ///
    /// assert_eq!(url.path(), "/Merchant/Index.aspx");
    /// assert!(url.as_str().contains("InvId=42"));
    /// ```
    pub fn payment_url(&self, request: &PaymentRequest) -> Result<Url> {
        let shop_id = self.signer.credentials.require_shop_id()?;
        let signature = self.build_payment_signature(request)?;
        let invoice_id = request.invoice_id.to_string();

        let mut params: Vec<(String, String)> = vec![
            ("MerchantLogin".to_string(), shop_id.to_string()),
            ("OutSum".to_string(), request.amount.clone()),
            ("InvId".to_string(), invoice_id),
        ];
        if let Some(description) = &request.description {
            params.push(("Description".to_string(), description.clone()));
        }
        params.push(("SignatureValue".to_string(), signature));
        if let Some(currency) = request.out_sum_currency() {
            params.push(("OutSumCurrency".to_string(), currency.code().to_string()));
        }
        if let Some(user_ip) = request.user_ip.as_ref().filter(|ip| !ip.is_empty()) {
            params.push(("UserIp".to_string(), user_ip.clone()));
        }
        let optional = [
            ("IncCurrLabel", &request.inc_curr_label),
            ("Culture", &request.culture),
            ("Email", &request.email),
            ("ExpirationDate", &request.expiration_date),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                params.push((name.to_string(), value.clone()));
            }
        }
        if self.test_mode {
            params.push(("IsTest".to_string(), "1".to_string()));
        }
        if let Some(receipt) = request.signed_receipt() {
            // The signed form is already url-encoded; it gets encoded once more here.
            params.push(("Receipt".to_string(), encode_receipt(receipt)?));
        }
        for (key, value) in &request.shop_data {
            params.push((key.clone(), value.clone()));
        }

        let mut url = self.base_url()?.join(CHECKOUT_PATH)?;
        url.query_pairs_mut().extend_pairs(params);

        debug!(invoice_id = request.invoice_id, test_mode = self.test_mode, "built checkout URL");
        Ok(url)
    }

    /// URL of the `OpStateExt` query for `invoice_id`.
    pub fn state_query_url(&self, invoice_id: u64) -> Result<Url> {
        let shop_id = self.signer.credentials.require_shop_id()?;
        let signature = self.signer.build_state_signature(invoice_id)?;
        let invoice_id = invoice_id.to_string();

        let endpoint = self
            .base_url()?
            .join(&format!("{}/{}", WEB_SERVICE_PATH, OP_STATE_EXT))?;
        Ok(Url::parse_with_params(
            endpoint.as_str(),
            &[
                ("MerchantLogin", shop_id),
                ("InvoiceID", invoice_id.as_str()),
                ("Signature", signature.as_str()),
            ],
        )?)
    }

    /// Queries the gateway for the current state of `invoice_id`.
    ///
    /// A gateway refusal (non-zero `Result/Code`) comes back as a parsed
    /// response for the caller to inspect.
    ///
    /// # Errors
    ///
    /// [`RobokassaError::Configuration`] when the shop id, password #2 or
    /// algorithm is unset, any transport error from the loader, and
    /// [`RobokassaError::XmlParse`] for a malformed document.
    ///
    /// [`RobokassaError::Configuration`]: crate::errors::RobokassaError::Configuration
    /// [`RobokassaError::XmlParse`]: crate::errors::RobokassaError::XmlParse
    pub async fn fetch_operation_state(&self, invoice_id: u64) -> Result<OperationStateResponse> {
        let url = self.state_query_url(invoice_id)?;
        let body = self.loader.load(&url).await?;
        let response = parse_operation_state(&body)?;

        if !response.is_success() {
            debug!(
                invoice_id,
                code = response.result.code,
                "gateway refused state query"
            );
        }
        for warning in response.warnings() {
            warn!(invoice_id, %warning, "incomplete state response");
        }
        Ok(response)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RobokassaError::InvalidArgument(format!(
            "{} must be a boolean flag, got '{}'",
            name, value
        ))),
    }
}

impl std::fmt::Debug for RobokassaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobokassaClient")
            .field("signer", &self.signer)
            .field("country", &self.country)
            .field("auth_host", &self.auth_host)
            .field("test_mode", &self.test_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Receipt, ReceiptItem};
    use crate::utils::hex_digest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn configured() -> RobokassaClient {
        RobokassaClient::new()
            .with_shop_id("demo_shop")
            .with_password1("p1")
            .with_password2("p2")
            .with_hash_algorithm(HashAlgorithm::Md5)
    }

    #[derive(Default)]
    struct RecordingLoader {
        body: String,
        seen: Arc<Mutex<Vec<Url>>>,
    }

    #[async_trait]
    impl XmlLoader for RecordingLoader {
        async fn load(&self, url: &Url) -> Result<String> {
            self.seen.lock().unwrap().push(url.clone());
            Ok(self.body.clone())
        }
    }

    #[test]
    fn test_client_defaults() {
        let client = RobokassaClient::new();
        assert_eq!(client.country, Country::Kz);
        assert_eq!(client.auth_host, DEFAULT_AUTH_HOST);
        assert!(!client.test_mode);
        assert!(client.signer.algorithm.is_none());
        assert_eq!(client.base_url().unwrap().as_str(), "https://auth.robokassa.kz/");
    }

    #[test]
    fn test_config_builders() {
        let client = configured().with_country("RU").unwrap().with_test_mode(true);

        assert_eq!(client.country, Country::Ru);
        assert!(client.test_mode);
        assert_eq!(client.signer.credentials.shop_id.as_deref(), Some("demo_shop"));
        assert_eq!(client.signer.algorithm, Some(HashAlgorithm::Md5));
    }

    #[test]
    fn test_parse_flag() {
        for value in ["1", "true", "YES", " on "] {
            assert!(parse_flag("ROBOKASSA_TEST_MODE", value).unwrap());
        }
        for value in ["0", "False", "no", "off"] {
            assert!(!parse_flag("ROBOKASSA_TEST_MODE", value).unwrap());
        }

        let err = parse_flag("ROBOKASSA_TEST_MODE", "enabled").unwrap_err();
        assert!(matches!(err, RobokassaError::InvalidArgument(_)));
        assert!(err.to_string().contains("ROBOKASSA_TEST_MODE"));
    }

    #[test]
    fn test_from_env_rejects_unknown_test_mode() {
        // the only test touching ROBOKASSA_TEST_MODE
        std::env::set_var("ROBOKASSA_TEST_MODE", "maybe");
        let result = RobokassaClient::from_env();
        std::env::remove_var("ROBOKASSA_TEST_MODE");

        assert!(matches!(result, Err(RobokassaError::InvalidArgument(_))));
    }

    #[test]
    fn test_with_country_rejects_unknown() {
        let err = configured().with_country("xx").unwrap_err();
        assert!(matches!(err, RobokassaError::InvalidArgument(_)));
    }

    #[test]
    fn test_state_query_url() {
        let url = configured().state_query_url(42).unwrap();
        let signature = hex_digest(HashAlgorithm::Md5, "demo_shop:42:p2");

        assert_eq!(
            url.as_str(),
            format!(
                "https://auth.robokassa.kz/Merchant/WebService/Service.asmx/OpStateExt?MerchantLogin=demo_shop&InvoiceID=42&Signature={}",
                signature
            )
        );
    }

    #[test]
    fn test_state_query_url_follows_country() {
        let url = configured().with_country("ru").unwrap().state_query_url(1).unwrap();
        assert_eq!(url.host_str(), Some("auth.robokassa.ru"));
    }

    #[test]
    fn test_state_query_requires_password2() {
        let client = RobokassaClient::new()
            .with_shop_id("demo_shop")
            .with_password1("p1")
            .with_hash_algorithm(HashAlgorithm::Md5);
        assert!(matches!(
            client.state_query_url(1),
            Err(RobokassaError::Configuration(_))
        ));
    }

    #[test]
    fn test_payment_url_parameters() {
        let client = configured().with_test_mode(true);
        let request = PaymentRequest::new("100.00", 42)
            .with_description("Order 42")
            .with_currency("eur")
            .with_email("buyer@example.com")
            .with_shop_param("Shp_user", "alice");

        let url = client.payment_url(&request).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(url.host_str(), Some("auth.robokassa.kz"));
        assert_eq!(get("MerchantLogin"), Some("demo_shop"));
        assert_eq!(get("OutSum"), Some("100.00"));
        assert_eq!(get("Description"), Some("Order 42"));
        assert_eq!(get("OutSumCurrency"), Some("EUR"));
        assert_eq!(get("Email"), Some("buyer@example.com"));
        assert_eq!(get("IsTest"), Some("1"));
        assert_eq!(get("Shp_user"), Some("alice"));
        assert_eq!(
            get("SignatureValue"),
            Some(client.build_payment_signature(&request).unwrap().as_str())
        );
    }

    #[test]
    fn test_payment_url_receipt_round_trips() {
        let receipt = Receipt::new().with_item(ReceiptItem::new("Кофе", 1.0, 10.0, "none"));
        let request = PaymentRequest::new("10.00", 7).with_receipt(receipt.clone());

        let url = configured().payment_url(&request).unwrap();
        let sent = url
            .query_pairs()
            .find(|(k, _)| k == "Receipt")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        // the gateway decodes the parameter once and gets the encoded JSON back
        assert_eq!(sent, encode_receipt(&receipt).unwrap());
    }

    #[test]
    fn test_payment_url_omits_unlisted_currency() {
        let request = PaymentRequest::new("1.00", 1).with_currency("GBP");
        let url = configured().payment_url(&request).unwrap();
        assert!(!url.as_str().contains("OutSumCurrency"));
        assert!(!url.as_str().contains("IsTest"));
    }

    #[tokio::test]
    async fn test_fetch_operation_state_uses_loader() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let loader = RecordingLoader {
            body: "<OperationStateResponse><Result><Code>0</Code></Result>\
                   <State><Code>5</Code><RequestDate>2024-01-01T00:00:00+05:00</RequestDate>\
                   <StateDate>2024-01-01T00:00:00+05:00</StateDate></State></OperationStateResponse>"
                .to_string(),
            seen: seen.clone(),
        };

        let client = configured().with_country("ru").unwrap().with_loader(loader);
        let response = client.fetch_operation_state(42).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.status(), Some(crate::state::PaymentStatus::Initiated));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].host_str(), Some("auth.robokassa.ru"));
        assert!(seen[0].as_str().contains("InvoiceID=42"));
    }

    #[tokio::test]
    async fn test_fetch_operation_state_malformed() {
        let loader = RecordingLoader {
            body: "<OperationStateResponse><Result>".to_string(),
            ..Default::default()
        };
        let client = configured().with_loader(loader);

        let err = client.fetch_operation_state(42).await.unwrap_err();
        assert!(matches!(err, RobokassaError::XmlParse(_)));
    }
}
