//! `PayU` payment request signing.
//!
//! The gateway verifies a SHA-512 digest over
//! `key|txnid|amount|productinfo|firstname|email|udf1||||||||||salt`
//! (ten empty user-defined fields between `udf1` and the salt). The salt
//! never leaves the server. Shopper-supplied fields may not contain the `|`
//! separator.

use rand::seq::IndexedRandom;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::{Digest, Sha512};
use spree_storefront_core::{Email, Money, OrderNumber};
use url::Url;

use super::CheckoutError;
use crate::config::PayuBizConfig;
use crate::spree::Address;

/// Characters used for the random transaction id suffix.
const TXNID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of the random transaction id suffix.
const TXNID_SUFFIX_LEN: usize = 9;

/// What the shopper is paying for.
#[derive(Debug, Clone, Copy)]
pub struct PaymentInput<'a> {
    pub order_number: &'a OrderNumber,
    pub amount: Money,
    pub billing: &'a Address,
    pub email: &'a Email,
}

/// Signed payment request as the gateway bridge expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub key: String,
    pub txnid: String,
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub phone: String,
    pub udf1: String,
    pub surl: String,
    pub furl: String,
    pub hash: String,
}

/// Fields covered by the payment hash.
#[derive(Debug, Clone, Copy)]
pub struct HashFields<'a> {
    pub key: &'a str,
    pub txnid: &'a str,
    pub amount: &'a str,
    pub productinfo: &'a str,
    pub firstname: &'a str,
    pub email: &'a str,
    pub udf1: &'a str,
}

/// Separator of the hash sequence.
const HASH_SEPARATOR: char = '|';

fn ensure_unseparated(field: &'static str, value: &str) -> Result<(), CheckoutError> {
    if value.contains(HASH_SEPARATOR) {
        return Err(CheckoutError::InvalidPaymentField(field));
    }
    Ok(())
}

/// Hex-encoded SHA-512 of the gateway hash sequence.
#[must_use]
pub fn payment_hash(fields: &HashFields<'_>, salt: &SecretString) -> String {
    let sequence = format!(
        "{}|{}|{}|{}|{}|{}|{}||||||||||{}",
        fields.key,
        fields.txnid,
        fields.amount,
        fields.productinfo,
        fields.firstname,
        fields.email,
        fields.udf1,
        salt.expose_secret(),
    );
    hex::encode(Sha512::digest(sequence.as_bytes()))
}

/// Transaction id: order number followed by nine random uppercase base-36
/// characters.
#[must_use]
pub fn generate_txnid(order_number: &OrderNumber) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..TXNID_SUFFIX_LEN)
        .filter_map(|_| TXNID_ALPHABET.choose(&mut rng).copied().map(char::from))
        .collect();
    format!("{order_number}{suffix}")
}

/// Builds signed payment requests for one merchant account.
#[derive(Clone)]
pub struct PaymentRequestBuilder {
    key: String,
    salt: SecretString,
    productinfo: String,
    success_url: String,
    failure_url: String,
}

impl std::fmt::Debug for PaymentRequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRequestBuilder")
            .field("key", &self.key)
            .field("salt", &"[REDACTED]")
            .field("productinfo", &self.productinfo)
            .field("success_url", &self.success_url)
            .field("failure_url", &self.failure_url)
            .finish()
    }
}

impl PaymentRequestBuilder {
    /// Builder for the merchant in `config`, with gateway callbacks on the
    /// Spree backend at `api_endpoint`.
    #[must_use]
    pub fn new(config: &PayuBizConfig, api_endpoint: &Url) -> Self {
        Self {
            key: config.key.clone(),
            salt: config.salt.clone(),
            productinfo: format!("{}-Product", config.app_name),
            success_url: format!("{api_endpoint}payubiz/handle_payment"),
            failure_url: format!("{api_endpoint}payubiz/canceled_payment"),
        }
    }

    /// Build a request with a fresh transaction id.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidPaymentField` if a signed field contains
    /// `|`.
    pub fn build(&self, input: &PaymentInput<'_>) -> Result<PaymentRequest, CheckoutError> {
        self.build_with_txnid(input, generate_txnid(input.order_number))
    }

    /// Build a request with a caller-chosen transaction id.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidPaymentField` if a signed field contains
    /// `|`.
    pub fn build_with_txnid(
        &self,
        input: &PaymentInput<'_>,
        txnid: String,
    ) -> Result<PaymentRequest, CheckoutError> {
        ensure_unseparated("firstname", &input.billing.firstname)?;
        ensure_unseparated("txnid", &txnid)?;
        ensure_unseparated("udf1", input.order_number.as_str())?;

        let amount = input.amount.to_string();
        let udf1 = input.order_number.to_string();
        let hash = payment_hash(
            &HashFields {
                key: &self.key,
                txnid: &txnid,
                amount: &amount,
                productinfo: &self.productinfo,
                firstname: &input.billing.firstname,
                email: input.email.as_str(),
                udf1: &udf1,
            },
            &self.salt,
        );

        Ok(PaymentRequest {
            key: self.key.clone(),
            txnid,
            amount,
            productinfo: self.productinfo.clone(),
            firstname: input.billing.firstname.clone(),
            email: input.email.as_str().to_string(),
            phone: input.billing.phone.clone(),
            udf1,
            surl: self.success_url.clone(),
            furl: self.failure_url.clone(),
            hash,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> PayuBizConfig {
        PayuBizConfig {
            key: "gtKFFx".to_string(),
            salt: SecretString::from("eCwWELxi".to_string()),
            app_name: "Pickles".to_string(),
        }
    }

    fn billing() -> Address {
        Address {
            id: None,
            firstname: "Asha".to_string(),
            lastname: "Rao".to_string(),
            address1: "12 MG Road".to_string(),
            address2: None,
            city: "Pune".to_string(),
            zipcode: "411001".to_string(),
            phone: "9999999999".to_string(),
            state_id: None,
            country_id: None,
        }
    }

    fn builder() -> PaymentRequestBuilder {
        let endpoint = Url::parse("https://api.example.com/").unwrap();
        PaymentRequestBuilder::new(&config(), &endpoint)
    }

    #[test]
    fn test_hash_matches_reference_digest() {
        let fields = HashFields {
            key: "k",
            txnid: "t",
            amount: "1",
            productinfo: "p",
            firstname: "f",
            email: "e",
            udf1: "u",
        };
        let expected = hex::encode(Sha512::digest(b"k|t|1|p|f|e|u||||||||||s"));
        assert_eq!(payment_hash(&fields, &SecretString::from("s".to_string())), expected);
        assert_eq!(expected.len(), 128);
    }

    #[test]
    fn test_txnid_shape() {
        let number = OrderNumber::new("R123");
        let txnid = generate_txnid(&number);
        let suffix = txnid.strip_prefix("R123").unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_request_fields() {
        let number = OrderNumber::new("R123");
        let email = Email::parse("asha@example.com").unwrap();
        let billing = billing();
        let input = PaymentInput {
            order_number: &number,
            amount: "25.50".parse().unwrap(),
            billing: &billing,
            email: &email,
        };

        let request = builder()
            .build_with_txnid(&input, "R123ABCDEFGHI".to_string())
            .unwrap();
        assert_eq!(request.key, "gtKFFx");
        assert_eq!(request.amount, "25.50");
        assert_eq!(request.productinfo, "Pickles-Product");
        assert_eq!(request.firstname, "Asha");
        assert_eq!(request.phone, "9999999999");
        assert_eq!(request.udf1, "R123");
        assert_eq!(request.surl, "https://api.example.com/payubiz/handle_payment");
        assert_eq!(request.furl, "https://api.example.com/payubiz/canceled_payment");

        let expected = hex::encode(Sha512::digest(
            b"gtKFFx|R123ABCDEFGHI|25.50|Pickles-Product|Asha|asha@example.com|R123||||||||||eCwWELxi",
        ));
        assert_eq!(request.hash, expected);
    }

    #[test]
    fn test_separator_in_first_name_is_rejected() {
        let number = OrderNumber::new("R123");
        let email = Email::parse("asha@example.com").unwrap();
        let billing = Address {
            firstname: "Asha|x".to_string(),
            ..billing()
        };
        let input = PaymentInput {
            order_number: &number,
            amount: "25.50".parse().unwrap(),
            billing: &billing,
            email: &email,
        };

        let result = builder().build_with_txnid(&input, "R123ABCDEFGHI".to_string());

        assert!(matches!(
            result,
            Err(CheckoutError::InvalidPaymentField("firstname"))
        ));
    }

    #[test]
    fn test_debug_redacts_salt() {
        let debug = format!("{:?}", builder());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("eCwWELxi"));
    }
}
