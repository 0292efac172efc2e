//! Control signatures for the Robokassa protocols.
//!
//! Every request and callback exchanged with the gateway carries a digest
//! over a `:`-joined list of fields and one of the shop's passwords. The
//! field order, the shop-data suffix and the casing of the digest are fixed
//! by the gateway; the builders here reproduce them byte for byte.
//!
//! | Variant  | Signable string                                                          | Case  |
//! |----------|--------------------------------------------------------------------------|-------|
//! | checkout | `shop:amount:inv[:CUR][:ip][:receipt]:password1[:Shp_k=v...]`            | lower |
//! | success  | `amount:inv:password1[:Shp_k=v...]`                                      | UPPER |
//! | result   | `amount:inv:password2[:Shp_k=v...]`                                      | UPPER |
//! | state    | `shop:inv:password2`                                                     | lower |

use crate::errors::{Result, RobokassaError};
use crate::types::{CallbackKind, HashAlgorithm, MerchantCredentials, PaymentRequest, ShopData};
use crate::utils::{digest_eq, encode_receipt, hex_digest, shop_data_suffix, DELIMITER};
use tracing::debug;

/// Builds the control signatures of one shop.
///
/// # Examples
///
/// ```
/// use robokassa_rs::signature::SignatureBuilder;
/// use robokassa_rs::types::{HashAlgorithm, MerchantCredentials};
///
/// let signer = SignatureBuilder::new(MerchantCredentials::new("shop", "p1", "p2"))
///     .with_algorithm(HashAlgorithm::Md5);
///
/// let signature = signer.build_callback_signature("success", "100.00", 42, None).unwrap();
/// assert_eq!(signature, signature.to_uppercase());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureBuilder {
    /// Shop identifier and passwords
    pub credentials: MerchantCredentials,

    /// Digest algorithm; there is no default
    pub algorithm: Option<HashAlgorithm>,
}

impl SignatureBuilder {
    /// Creates a builder for `credentials` without an algorithm.
    pub fn new(credentials: MerchantCredentials) -> Self {
        Self {
            credentials,
            algorithm: None,
        }
    }

    /// Sets the digest algorithm.
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    fn require_algorithm(&self) -> Result<HashAlgorithm> {
        self.algorithm.ok_or_else(|| RobokassaError::unset("hash algorithm"))
    }

    /// Signature of a checkout request (`SignatureValue`).
    ///
    /// Returned as the lowercase hex digest, without case conversion.
    ///
    /// # Errors
    ///
    /// [`RobokassaError::Configuration`] when the shop id, password #1 or the
    /// algorithm is unset; [`RobokassaError::Json`] if the receipt cannot be
    /// serialized.
    pub fn build_payment_signature(&self, request: &PaymentRequest) -> Result<String> {
        let shop_id = self.credentials.require_shop_id()?;
        let password1 = self.credentials.require_password1()?;
        let algorithm = self.require_algorithm()?;

        let mut fields: Vec<String> = vec![
            shop_id.to_string(),
            request.amount.clone(),
            request.invoice_id.to_string(),
        ];
        if let Some(currency) = request.out_sum_currency() {
            fields.push(currency.code().to_string());
        }
        if let Some(user_ip) = request.user_ip.as_deref().filter(|ip| !ip.is_empty()) {
            fields.push(user_ip.to_string());
        }
        if let Some(receipt) = request.signed_receipt() {
            fields.push(encode_receipt(receipt)?);
        }
        fields.push(password1.to_string());

        let signable = join_fields(&fields, &request.shop_data);
        debug!(invoice_id = request.invoice_id, %algorithm, "built checkout signature");
        Ok(hex_digest(algorithm, &signable))
    }

    /// Signature of a Success or Result callback.
    ///
    /// `kind` is matched case-insensitively against `success` and `result`.
    /// The digest is returned in uppercase, as the gateway sends it.
    ///
    /// # Errors
    ///
    /// [`RobokassaError::InvalidArgument`] for any other `kind`;
    /// [`RobokassaError::Configuration`] when the password selected by
    /// `kind` or the algorithm is unset.
    pub fn build_callback_signature(
        &self,
        kind: &str,
        amount: &str,
        invoice_id: u64,
        shop_data: Option<&ShopData>,
    ) -> Result<String> {
        let kind: CallbackKind = kind.parse()?;
        self.callback_signature(kind, amount, invoice_id, shop_data)
    }

    /// Same as [`build_callback_signature`](Self::build_callback_signature)
    /// with an already parsed [`CallbackKind`].
    pub fn callback_signature(
        &self,
        kind: CallbackKind,
        amount: &str,
        invoice_id: u64,
        shop_data: Option<&ShopData>,
    ) -> Result<String> {
        let password = match kind {
            CallbackKind::Success => self.credentials.require_password1()?,
            CallbackKind::Result => self.credentials.require_password2()?,
        };
        let algorithm = self.require_algorithm()?;

        let fields = [
            amount.to_string(),
            invoice_id.to_string(),
            password.to_string(),
        ];
        let empty = ShopData::new();
        let signable = join_fields(&fields, shop_data.unwrap_or(&empty));
        debug!(invoice_id, ?kind, %algorithm, "built callback signature");
        Ok(hex_digest(algorithm, &signable).to_uppercase())
    }

    /// Signature of an `OpStateExt` web-service query, lowercase hex.
    pub fn build_state_signature(&self, invoice_id: u64) -> Result<String> {
        let shop_id = self.credentials.require_shop_id()?;
        let password2 = self.credentials.require_password2()?;
        let algorithm = self.require_algorithm()?;

        let fields = [
            shop_id.to_string(),
            invoice_id.to_string(),
            password2.to_string(),
        ];
        let signable = join_fields(&fields, &ShopData::new());
        debug!(invoice_id, %algorithm, "built state query signature");
        Ok(hex_digest(algorithm, &signable))
    }

    /// Checks a signature received from the gateway on a callback.
    ///
    /// The comparison ignores case.
    pub fn verify_callback_signature(
        &self,
        kind: CallbackKind,
        amount: &str,
        invoice_id: u64,
        shop_data: Option<&ShopData>,
        received: &str,
    ) -> Result<bool> {
        let expected = self.callback_signature(kind, amount, invoice_id, shop_data)?;
        Ok(digest_eq(&expected, received))
    }
}

/// Joins `fields` with the delimiter and appends the shop-data suffix.
fn join_fields(fields: &[String], shop_data: &ShopData) -> String {
    let mut signable = fields.join(DELIMITER);
    signable.push_str(&shop_data_suffix(shop_data));
    signable
}
