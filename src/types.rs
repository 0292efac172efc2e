//! Core type definitions for the Robokassa protocol.
//!
//! This module contains the configuration value types (hash algorithms,
//! countries, currencies), the callback kinds, merchant credentials and the
//! fiscal receipt model that is signed together with a checkout request.

use crate::errors::{Result, RobokassaError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Merchant-defined `Shp_*` parameters.
///
/// Insertion order is part of the signature contract, so this is an
/// [`IndexMap`] rather than a `HashMap`.
pub type ShopData = IndexMap<String, String>;

/// Digest algorithm used for every control signature of a shop.
///
/// Must match the algorithm selected in the merchant's technical settings.
///
/// # Examples
///
/// ```
/// use robokassa_rs::types::HashAlgorithm;
///
/// let algo: HashAlgorithm = "SHA256".parse().unwrap();
/// assert_eq!(algo, HashAlgorithm::Sha256);
/// assert_eq!(algo.to_string(), "sha256");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// MD5
    #[serde(rename = "md5")]
    Md5,
    /// RIPEMD-160
    #[serde(rename = "ripemd160")]
    Ripemd160,
    /// SHA-1
    #[serde(rename = "sha1")]
    Sha1,
    /// SHA-256
    #[serde(rename = "sha256")]
    Sha256,
    /// SHA-384
    #[serde(rename = "sha384")]
    Sha384,
    /// SHA-512
    #[serde(rename = "sha512")]
    Sha512,
    /// SHA3-256. Not offered in the gateway's shop settings; for signing
    /// data that never reaches the gateway.
    #[serde(rename = "sha3-256")]
    Sha3_256,
    /// SHA3-512. Not offered in the gateway's shop settings; for signing
    /// data that never reaches the gateway.
    #[serde(rename = "sha3-512")]
    Sha3_512,
}

impl HashAlgorithm {
    /// Standard digest name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Ripemd160 => "ripemd160",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha3_256 => "sha3-256",
            HashAlgorithm::Sha3_512 => "sha3-512",
        }
    }

    /// Whether the gateway can verify signatures made with this algorithm.
    pub fn is_offered_by_gateway(&self) -> bool {
        !matches!(self, HashAlgorithm::Sha3_256 | HashAlgorithm::Sha3_512)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = RobokassaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "ripemd160" | "ripemd-160" => Ok(HashAlgorithm::Ripemd160),
            "sha1" | "sha-1" => Ok(HashAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha384" | "sha-384" => Ok(HashAlgorithm::Sha384),
            "sha512" | "sha-512" => Ok(HashAlgorithm::Sha512),
            "sha3-256" | "sha3_256" => Ok(HashAlgorithm::Sha3_256),
            "sha3-512" | "sha3_512" => Ok(HashAlgorithm::Sha3_512),
            other => Err(RobokassaError::InvalidArgument(format!(
                "unsupported hash algorithm '{}'",
                other
            ))),
        }
    }
}

/// Country whose gateway host the client talks to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Country {
    /// Kazakhstan, `auth.robokassa.kz`
    #[default]
    Kz,
    /// Russia, `auth.robokassa.ru`
    Ru,
}

impl Country {
    /// Top-level domain of the gateway host for this country.
    pub fn tld(&self) -> &'static str {
        match self {
            Country::Kz => "kz",
            Country::Ru => "ru",
        }
    }
}

impl FromStr for Country {
    type Err = RobokassaError;

    /// Parses a country code case-insensitively.
    ///
    /// ```
    /// use robokassa_rs::types::Country;
    ///
    /// assert_eq!("RU".parse::<Country>().unwrap(), Country::Ru);
    /// assert!("xx".parse::<Country>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "kz" => Ok(Country::Kz),
            "ru" => Ok(Country::Ru),
            _ => Err(RobokassaError::InvalidArgument(format!(
                "unsupported country '{}', expected one of: kz, ru",
                s
            ))),
        }
    }
}

/// Currencies the gateway accepts for `OutSumCurrency`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar
    Usd,
    /// Euro
    Eur,
    /// Kazakhstani tenge
    Kzt,
}

impl Currency {
    /// Looks a currency code up in the allow-list.
    ///
    /// Unlisted codes yield `None` rather than an error; the signature simply
    /// omits the currency field for them.
    ///
    /// ```
    /// use robokassa_rs::types::Currency;
    ///
    /// assert_eq!(Currency::from_code("usd"), Some(Currency::Usd));
    /// assert_eq!(Currency::from_code("GBP"), None);
    /// ```
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "KZT" => Some(Currency::Kzt),
            _ => None,
        }
    }

    /// ISO 4217 code as sent to the gateway.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Kzt => "KZT",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which gateway callback a signature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    /// Customer redirect to the Success URL, signed with password #1
    Success,
    /// Server-to-server notification to the Result URL, signed with password #2
    Result,
}

impl FromStr for CallbackKind {
    type Err = RobokassaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(CallbackKind::Success),
            "result" => Ok(CallbackKind::Result),
            _ => Err(RobokassaError::InvalidArgument(format!(
                "unsupported callback type '{}', expected one of: success, result",
                s
            ))),
        }
    }
}

/// Shop identifier and the two technical passwords.
///
/// Every field is optional so that the client can be configured piece by
/// piece; signing fails fast on whichever one it needs and finds unset.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MerchantCredentials {
    /// Shop identifier (`MerchantLogin`)
    pub shop_id: Option<String>,

    /// Password #1, used for checkout and Success callbacks
    pub password1: Option<String>,

    /// Password #2, used for Result callbacks and the XML web service
    pub password2: Option<String>,
}

impl MerchantCredentials {
    /// Creates a complete set of credentials.
    pub fn new(
        shop_id: impl Into<String>,
        password1: impl Into<String>,
        password2: impl Into<String>,
    ) -> Self {
        Self {
            shop_id: Some(shop_id.into()),
            password1: Some(password1.into()),
            password2: Some(password2.into()),
        }
    }

    /// Shop identifier, or a configuration error when unset or empty.
    pub fn require_shop_id(&self) -> Result<&str> {
        require(&self.shop_id, "shop id")
    }

    /// Password #1, or a configuration error when unset or empty.
    pub fn require_password1(&self) -> Result<&str> {
        require(&self.password1, "password1")
    }

    /// Password #2, or a configuration error when unset or empty.
    pub fn require_password2(&self) -> Result<&str> {
        require(&self.password2, "password2")
    }
}

// Passwords stay out of debug output.
impl fmt::Debug for MerchantCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("MerchantCredentials")
            .field("shop_id", &self.shop_id)
            .field("password1", &mask(&self.password1))
            .field("password2", &mask(&self.password2))
            .finish()
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RobokassaError::unset(name)),
    }
}

/// Fiscal receipt sent along with a checkout request.
///
/// # Examples
///
/// ```
/// use robokassa_rs::types::{Receipt, ReceiptItem};
///
/// let receipt = Receipt::new()
///     .with_sno("osn")
///     .with_item(ReceiptItem::new("Подписка", 1.0, 100.0, "none"));
/// assert!(!receipt.is_empty());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Receipt {
    /// Taxation system of the shop (e.g. "osn", "usn_income")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sno: Option<String>,

    /// Line items
    pub items: Vec<ReceiptItem>,
}

impl Receipt {
    /// Creates an empty receipt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the taxation system.
    pub fn with_sno(mut self, sno: impl Into<String>) -> Self {
        self.sno = Some(sno.into());
        self
    }

    /// Appends a line item.
    pub fn with_item(mut self, item: ReceiptItem) -> Self {
        self.items.push(item);
        self
    }

    /// A receipt without items is not sent and not signed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One line of a [`Receipt`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReceiptItem {
    /// Product name as printed on the receipt
    pub name: String,

    /// Quantity
    pub quantity: f64,

    /// Total sum for the line
    pub sum: f64,

    /// Tax rate code (e.g. "none", "vat0", "vat12")
    pub tax: String,

    /// Payment method (e.g. "full_payment")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,

    /// Payment object (e.g. "commodity", "service")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_object: Option<String>,
}

impl ReceiptItem {
    /// Creates a line item without payment method/object.
    pub fn new(name: impl Into<String>, quantity: f64, sum: f64, tax: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            sum,
            tax: tax.into(),
            payment_method: None,
            payment_object: None,
        }
    }

    /// Sets the payment method.
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    /// Sets the payment object.
    pub fn with_payment_object(mut self, object: impl Into<String>) -> Self {
        self.payment_object = Some(object.into());
        self
    }
}

/// Fields of a checkout request.
///
/// The signed subset is `amount`, `invoice_id`, `currency`, `user_ip`,
/// `receipt` and `shop_data`; the rest only travels in the checkout URL.
///
/// # Examples
///
/// ```
/// use robokassa_rs::types::PaymentRequest;
///
/// let request = PaymentRequest::new("100.00", 42)
///     .with_description("Order #42")
///     .with_currency("kzt")
///     .with_shop_param("Shp_user", "alice");
/// assert_eq!(request.shop_data.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentRequest {
    /// Amount as the decimal string the customer pays (`OutSum`)
    pub amount: String,

    /// Shop-side invoice number (`InvId`)
    pub invoice_id: u64,

    /// Order description shown to the customer
    pub description: Option<String>,

    /// Fiscal receipt
    pub receipt: Option<Receipt>,

    /// `Shp_*` parameters
    pub shop_data: ShopData,

    /// Requested `OutSumCurrency`; only allow-listed codes are sent
    pub currency: Option<String>,

    /// Customer IP address
    pub user_ip: Option<String>,

    /// Customer e-mail
    pub email: Option<String>,

    /// Payment page language (e.g. "ru", "en", "kk")
    pub culture: Option<String>,

    /// Preselected payment method label
    pub inc_curr_label: Option<String>,

    /// Invoice expiration timestamp, ISO 8601
    pub expiration_date: Option<String>,
}

impl PaymentRequest {
    /// Creates a request for `amount` under invoice number `invoice_id`.
    pub fn new(amount: impl Into<String>, invoice_id: u64) -> Self {
        Self {
            amount: amount.into(),
            invoice_id,
            ..Self::default()
        }
    }

    /// Sets the order description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a fiscal receipt.
    pub fn with_receipt(mut self, receipt: Receipt) -> Self {
        self.receipt = Some(receipt);
        self
    }

    /// Appends a `Shp_*` parameter.
    pub fn with_shop_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.shop_data.insert(key.into(), value.into());
        self
    }

    /// Sets the requested currency.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Sets the customer IP address.
    pub fn with_user_ip(mut self, user_ip: impl Into<String>) -> Self {
        self.user_ip = Some(user_ip.into());
        self
    }

    /// Sets the customer e-mail.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the payment page language.
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    /// Preselects a payment method.
    pub fn with_inc_curr_label(mut self, label: impl Into<String>) -> Self {
        self.inc_curr_label = Some(label.into());
        self
    }

    /// Sets the invoice expiration timestamp.
    pub fn with_expiration_date(mut self, date: impl Into<String>) -> Self {
        self.expiration_date = Some(date.into());
        self
    }

    /// The allow-listed currency of this request, if any.
    pub fn out_sum_currency(&self) -> Option<Currency> {
        self.currency.as_deref().and_then(Currency::from_code)
    }

    /// The receipt, if one is attached and has items.
    pub fn signed_receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref().filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_algorithm_parsing() {
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert_eq!("SHA512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("sha-1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!(
            "RIPEMD160".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Ripemd160
        );
        assert!(matches!(
            "whirlpool".parse::<HashAlgorithm>(),
            Err(RobokassaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_gateway_algorithms() {
        for name in ["md5", "ripemd160", "sha1", "sha256", "sha384", "sha512"] {
            assert!(name.parse::<HashAlgorithm>().unwrap().is_offered_by_gateway());
        }
        assert!(!HashAlgorithm::Sha3_256.is_offered_by_gateway());
        assert!(!HashAlgorithm::Sha3_512.is_offered_by_gateway());
    }

    #[test]
    fn test_country_parsing() {
        assert_eq!("kz".parse::<Country>().unwrap(), Country::Kz);
        assert_eq!("Ru".parse::<Country>().unwrap(), Country::Ru);
        assert_eq!(Country::default().tld(), "kz");

        let err = "xx".parse::<Country>().unwrap_err();
        assert!(err.to_string().contains("kz, ru"));
    }

    #[test]
    fn test_currency_allow_list() {
        assert_eq!(Currency::from_code("eur"), Some(Currency::Eur));
        assert_eq!(Currency::from_code("KzT"), Some(Currency::Kzt));
        assert_eq!(Currency::from_code("RUB"), None);
        assert_eq!(Currency::Usd.to_string(), "USD");
    }

    #[test]
    fn test_callback_kind_parsing() {
        assert_eq!("SUCCESS".parse::<CallbackKind>().unwrap(), CallbackKind::Success);
        assert_eq!("result".parse::<CallbackKind>().unwrap(), CallbackKind::Result);

        let err = "fail".parse::<CallbackKind>().unwrap_err();
        assert!(err.to_string().contains("success, result"));
    }

    #[test]
    fn test_credentials_require_non_empty() {
        let creds = MerchantCredentials {
            shop_id: Some("shop".to_string()),
            password1: Some(String::new()),
            password2: None,
        };

        assert_eq!(creds.require_shop_id().unwrap(), "shop");
        assert!(matches!(creds.require_password1(), Err(RobokassaError::Configuration(_))));
        assert!(matches!(creds.require_password2(), Err(RobokassaError::Configuration(_))));
    }

    #[test]
    fn test_credentials_debug_masks_passwords() {
        let creds = MerchantCredentials::new("shop", "secret1", "secret2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("shop"));
        assert!(!debug.contains("secret1"));
        assert!(!debug.contains("secret2"));
    }

    #[test]
    fn test_receipt_serialization() {
        let receipt = Receipt::new().with_item(
            ReceiptItem::new("Book", 2.0, 500.0, "vat12").with_payment_method("full_payment"),
        );

        let json = serde_json::to_string(&receipt).unwrap();
        assert!(!json.contains("sno"));
        assert!(json.contains("\"payment_method\":\"full_payment\""));
        assert!(!json.contains("payment_object"));
        assert!(Receipt::new().is_empty());
    }
}
