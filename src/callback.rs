//! Handling of the gateway's Result and Success callbacks.
//!
//! After a payment the gateway notifies the shop's Result URL
//! (server-to-server, signed with password #2) and redirects the customer to
//! the Success URL (signed with password #1). Both carry `OutSum`, `InvId`,
//! `SignatureValue` and every `Shp_*` parameter of the checkout request.

use crate::errors::{Result, RobokassaError};
use crate::types::ShopData;
use url::form_urlencoded;

/// Prefix of merchant-defined parameters.
pub const SHOP_PARAM_PREFIX: &str = "shp_";

/// Parameters of a Result or Success callback.
///
/// # Examples
///
/// ```
/// use robokassa_rs::callback::CallbackParams;
///
/// let params = CallbackParams::from_query(
///     "OutSum=100.00&InvId=42&SignatureValue=ABCDEF&Shp_user=alice",
/// ).unwrap();
///
/// assert_eq!(params.inv_id, 42);
/// assert_eq!(params.shop_data["Shp_user"], "alice");
/// assert_eq!(params.acknowledgement(), "OK42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// `OutSum`, kept verbatim since it is part of the signed string
    pub out_sum: String,

    /// `InvId`
    pub inv_id: u64,

    /// `SignatureValue`
    pub signature: String,

    /// `Shp_*` parameters in the order they arrived
    pub shop_data: ShopData,

    /// `Fee`, the gateway's commission, when sent
    pub fee: Option<String>,

    /// `EMail` of the customer, when sent
    pub email: Option<String>,

    /// `PaymentMethod` used, when sent
    pub payment_method: Option<String>,
}

impl CallbackParams {
    /// Parses a url-encoded query string or form body.
    pub fn from_query(query: &str) -> Result<Self> {
        Self::from_pairs(
            form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Builds the parameters from already decoded name/value pairs.
    ///
    /// Parameter names are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// [`RobokassaError::InvalidArgument`] when `OutSum`, `InvId` or
    /// `SignatureValue` is missing or `InvId` is not a number.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut out_sum: Option<String> = None;
        let mut inv_id: Option<String> = None;
        let mut signature: Option<String> = None;
        let mut shop_data = ShopData::new();
        let mut fee: Option<String> = None;
        let mut email: Option<String> = None;
        let mut payment_method: Option<String> = None;

        for (key, value) in pairs {
            let key = key.as_ref();
            let lower = key.to_ascii_lowercase();
            match lower.as_str() {
                "outsum" => out_sum = Some(value.into()),
                "invid" => inv_id = Some(value.into()),
                "signaturevalue" => signature = Some(value.into()),
                "fee" => fee = Some(value.into()),
                "email" => email = Some(value.into()),
                "paymentmethod" => payment_method = Some(value.into()),
                _ if lower.starts_with(SHOP_PARAM_PREFIX) => {
                    shop_data.insert(key.to_string(), value.into());
                }
                _ => {}
            }
        }

        let inv_id = inv_id.ok_or_else(|| missing("InvId"))?;
        let inv_id = inv_id.trim().parse::<u64>().map_err(|_| {
            RobokassaError::InvalidArgument(format!("InvId '{}' is not a number", inv_id))
        })?;

        Ok(Self {
            out_sum: out_sum.ok_or_else(|| missing("OutSum"))?,
            inv_id,
            signature: signature.ok_or_else(|| missing("SignatureValue"))?,
            shop_data,
            fee,
            email,
            payment_method,
        })
    }

    /// Body the Result URL must answer with to confirm receipt.
    pub fn acknowledgement(&self) -> String {
        format!("OK{}", self.inv_id)
    }
}

fn missing(name: &str) -> RobokassaError {
    RobokassaError::InvalidArgument(format!("callback parameter {} is missing", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_callback() {
        let params = CallbackParams::from_query(
            "?out_summ=1&OutSum=100.00&InvId=42&Fee=3.5&EMail=a%40b.kz\
             &SignatureValue=DEADBEEF&shp_b=2&Shp_a=%D0%B4%D0%B0&IsTest=1",
        )
        .unwrap();

        assert_eq!(params.out_sum, "100.00");
        assert_eq!(params.inv_id, 42);
        assert_eq!(params.signature, "DEADBEEF");
        assert_eq!(params.fee.as_deref(), Some("3.5"));
        assert_eq!(params.email.as_deref(), Some("a@b.kz"));

        let keys: Vec<&str> = params.shop_data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["shp_b", "Shp_a"]);
        assert_eq!(params.shop_data["Shp_a"], "да");
    }

    #[test]
    fn test_lowercase_parameter_names() {
        let params =
            CallbackParams::from_pairs(vec![("outsum", "1.00"), ("invid", "7"), ("signaturevalue", "x")])
                .unwrap();
        assert_eq!(params.inv_id, 7);
        assert!(params.shop_data.is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let err = CallbackParams::from_query("OutSum=1.00&InvId=1").unwrap_err();
        assert!(err.to_string().contains("SignatureValue"));

        let err = CallbackParams::from_query("OutSum=1.00&SignatureValue=x").unwrap_err();
        assert!(err.to_string().contains("InvId"));

        let err = CallbackParams::from_query("OutSum=1.00&InvId=abc&SignatureValue=x").unwrap_err();
        assert!(matches!(err, RobokassaError::InvalidArgument(_)));
    }

    #[test]
    fn test_acknowledgement() {
        let params = CallbackParams::from_query("OutSum=1&InvId=100500&SignatureValue=x").unwrap();
        assert_eq!(params.acknowledgement(), "OK100500");
    }
}
