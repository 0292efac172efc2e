//! Typed model of the `OpStateExt` web-service response.
//!
//! The gateway answers a state query with a document like:
//!
//! ```xml
//! <OperationStateResponse xmlns="http://merchant.roboxchange.com/WebService/">
//!   <Result><Code>0</Code></Result>
//!   <State>
//!     <Code>100</Code>
//!     <RequestDate>2024-01-15T12:35:00+03:00</RequestDate>
//!     <StateDate>2024-01-15T12:34:56+03:00</StateDate>
//!   </State>
//!   <Info>...</Info>
//!   <UserField><Field><Name>shp_user</Name><Value>alice</Value></Field></UserField>
//! </OperationStateResponse>
//! ```
//!
//! A non-zero `Result/Code` is the gateway refusing the query (bad
//! signature, unknown invoice). That is reported in the parsed value, not as
//! an error; only a document that cannot be parsed fails. Gaps in an
//! otherwise usable document (no `State`, missing or unreadable dates) are
//! listed by [`OperationStateResponse::warnings`].

use crate::errors::Result;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// `Result/Code` of a successful query.
pub const RESULT_OK: u32 = 0;

/// Root of the `OpStateExt` document.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OperationStateResponse {
    /// Outcome of the query itself
    #[serde(rename = "Result")]
    pub result: ResultInfo,

    /// Current state of the operation; absent when the query failed
    #[serde(rename = "State", default)]
    pub state: Option<StateInfo>,

    /// Payment details; absent when the query failed
    #[serde(rename = "Info", default)]
    pub info: Option<PaymentInfo>,

    /// `Shp_*` parameters of the operation
    #[serde(rename = "UserField", default)]
    pub user_field: Option<UserFields>,
}

impl OperationStateResponse {
    /// Whether the gateway accepted the query.
    pub fn is_success(&self) -> bool {
        self.result.code == RESULT_OK
    }

    /// Status of the operation, if the query succeeded.
    pub fn status(&self) -> Option<PaymentStatus> {
        self.state.as_ref().map(StateInfo::status)
    }

    /// Looks up a user field by name, ignoring ASCII case.
    pub fn user_field(&self, name: &str) -> Option<&str> {
        self.user_field
            .as_ref()?
            .fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    /// Problems found in a document that still parsed.
    ///
    /// Empty for a refused query, since the gateway sends nothing beyond
    /// `Result` then.
    ///
    /// # Examples
    ///
    /// ```
    /// use robokassa_rs::state::parse_operation_state;
    ///
    /// let response = parse_operation_state(
    ///     "<OperationStateResponse><Result><Code>0</Code></Result>\
    ///      <State><Code>5</Code><StateDate>yesterday</StateDate></State>\
    ///      </OperationStateResponse>",
    /// ).unwrap();
    ///
    /// assert_eq!(
    ///     response.warnings(),
    ///     vec![
    ///         "State/RequestDate is missing".to_string(),
    ///         "State/StateDate 'yesterday' is not an RFC 3339 date".to_string(),
    ///     ]
    /// );
    /// ```
    pub fn warnings(&self) -> Vec<String> {
        if !self.is_success() {
            return Vec::new();
        }

        let state = match &self.state {
            Some(state) => state,
            None => return vec!["State is missing".to_string()],
        };

        let mut warnings = Vec::new();
        for (name, raw) in [
            ("RequestDate", &state.request_date),
            ("StateDate", &state.state_date),
        ] {
            match raw.as_deref() {
                None => warnings.push(format!("State/{} is missing", name)),
                Some(value) if parse_date(value).is_none() => warnings.push(format!(
                    "State/{} '{}' is not an RFC 3339 date",
                    name, value
                )),
                Some(_) => {}
            }
        }
        warnings
    }
}

/// `Result` element.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ResultInfo {
    /// 0 on success; 1 bad signature, 2 unknown shop, 3 unknown invoice,
    /// 4 duplicate invoice, 1000 gateway error
    #[serde(rename = "Code")]
    pub code: u32,

    /// Human-readable explanation of a non-zero code
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
}

/// `State` element.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StateInfo {
    /// Numeric state code, see [`PaymentStatus`]
    #[serde(rename = "Code")]
    pub code: u32,

    /// When the gateway served this query, as sent
    #[serde(rename = "RequestDate", default)]
    pub request_date: Option<String>,

    /// When the operation entered its current state, as sent
    #[serde(rename = "StateDate", default)]
    pub state_date: Option<String>,
}

impl StateInfo {
    /// Decoded state code.
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from(self.code)
    }

    /// `RequestDate` parsed as RFC 3339.
    pub fn request_date(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(self.request_date.as_deref()?)
    }

    /// `StateDate` parsed as RFC 3339.
    pub fn state_date(&self) -> Option<DateTime<FixedOffset>> {
        parse_date(self.state_date.as_deref()?)
    }
}

fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

/// `Info` element.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentInfo {
    /// Payment method label the customer paid with
    #[serde(default)]
    pub inc_curr_label: Option<String>,

    /// Amount paid by the customer
    #[serde(default)]
    pub inc_sum: Option<String>,

    /// Customer account (masked card number, wallet)
    #[serde(default)]
    pub inc_account: Option<String>,

    /// Payment method group
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,

    /// Currency credited to the shop
    #[serde(default)]
    pub out_curr_label: Option<String>,

    /// Amount credited to the shop
    #[serde(default)]
    pub out_sum: Option<String>,

    /// Gateway operation key
    #[serde(default)]
    pub op_key: Option<String>,
}

/// `Info/PaymentMethod` element.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentMethod {
    /// Method group code
    pub code: String,

    /// Method group name
    #[serde(default)]
    pub description: Option<String>,
}

/// `UserField` element.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct UserFields {
    /// Name/value pairs
    #[serde(rename = "Field", default)]
    pub fields: Vec<UserField>,
}

/// `UserField/Field` element.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct UserField {
    /// Parameter name
    pub name: String,

    /// Parameter value
    pub value: String,
}

/// State of an operation as reported by `State/Code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// 5: invoice created, not paid yet
    Initiated,
    /// 10: cancelled, no money received
    Cancelled,
    /// 50: money received, being credited to the shop
    Processing,
    /// 60: money returned to the customer
    Refunded,
    /// 80: execution suspended
    Suspended,
    /// 100: paid successfully
    Paid,
    /// Any code this crate does not know
    Unknown(u32),
}

impl From<u32> for PaymentStatus {
    fn from(code: u32) -> Self {
        match code {
            5 => PaymentStatus::Initiated,
            10 => PaymentStatus::Cancelled,
            50 => PaymentStatus::Processing,
            60 => PaymentStatus::Refunded,
            80 => PaymentStatus::Suspended,
            100 => PaymentStatus::Paid,
            other => PaymentStatus::Unknown(other),
        }
    }
}

impl PaymentStatus {
    /// Whether the operation can no longer change state.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Cancelled | PaymentStatus::Refunded | PaymentStatus::Paid
        )
    }
}

/// Parses an `OpStateExt` document.
///
/// # Errors
///
/// [`RobokassaError::XmlParse`](crate::errors::RobokassaError::XmlParse) if
/// the document is malformed or lacks the `Result` element.
pub fn parse_operation_state(xml: &str) -> Result<OperationStateResponse> {
    Ok(quick_xml::de::from_str(xml)?)
}
