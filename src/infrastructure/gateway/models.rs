//! Wire format of the payment gateway. Field order here is the order of the
//! serialized JSON, which is what gets signed.

use serde::{Deserialize, Serialize};

use crate::domain::gateway::{BasketLine, Buyer, PaymentCard, PaymentRequest};
use crate::domain::order::AddressFields;
use crate::domain::pricing::round_money;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub locale: String,
    pub conversation_id: String,
    pub price: String,
    pub paid_price: String,
    pub currency: String,
    pub installment: u8,
    pub basket_id: String,
    pub payment_channel: &'static str,
    pub payment_group: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub payment_card: WireCard,
    pub buyer: WireBuyer,
    pub shipping_address: WireAddress,
    pub billing_address: WireAddress,
    pub basket_items: Vec<WireBasketItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCard {
    pub card_holder_name: String,
    pub card_number: String,
    pub expire_month: String,
    pub expire_year: String,
    pub cvc: String,
    pub register_card: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBuyer {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub gsm_number: String,
    pub email: String,
    pub identity_number: String,
    pub registration_address: String,
    pub ip: String,
    pub city: String,
    pub country: String,
    pub zip_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAddress {
    pub contact_name: String,
    pub city: String,
    pub country: String,
    pub address: String,
    pub zip_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBasketItem {
    pub id: String,
    pub name: String,
    pub category1: &'static str,
    pub item_type: &'static str,
    pub price: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsAuthRequest {
    pub locale: String,
    pub conversation_id: String,
    pub payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_data: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinCheckRequest {
    pub locale: String,
    pub conversation_id: String,
    pub bin_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailRequest {
    pub locale: String,
    pub conversation_id: String,
    pub payment_id: String,
}

/// Every gateway reply carries `status` plus error fields on failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub status: String,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Deserialize)]
pub struct ThreeDsInitBody {
    #[serde(rename = "threeDSHtmlContent")]
    pub three_ds_html_content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    pub payment_id: Option<String>,
    pub basket_id: Option<String>,
    /// Sent as a JSON number; kept raw so no float rounding sneaks in.
    pub paid_price: Option<serde_json::Value>,
    pub currency: Option<String>,
    pub fraud_status: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinBody {
    pub bin_number: Option<String>,
    pub card_type: Option<String>,
    pub card_association: Option<String>,
    pub card_family: Option<String>,
    pub bank_name: Option<String>,
    pub commercial: Option<u8>,
}

fn money(value: &bigdecimal::BigDecimal) -> String {
    round_money(value).to_string()
}

fn street(address: &AddressFields) -> String {
    let mut parts = vec![address.line1.as_str()];
    parts.extend(address.line2.as_deref());
    parts.extend(address.district.as_deref());
    parts.join(", ")
}

impl From<&AddressFields> for WireAddress {
    fn from(address: &AddressFields) -> Self {
        Self {
            contact_name: address.full_name.clone(),
            city: address.city.clone(),
            country: address.country.clone(),
            address: street(address),
            zip_code: address.postal_code.clone(),
        }
    }
}

impl From<&PaymentCard> for WireCard {
    fn from(card: &PaymentCard) -> Self {
        Self {
            card_holder_name: card.holder_name.clone(),
            card_number: card.number.replace(' ', ""),
            expire_month: card.expire_month.clone(),
            expire_year: card.expire_year.clone(),
            cvc: card.cvc.clone(),
            register_card: 0,
        }
    }
}

fn wire_buyer(buyer: &Buyer, address: &AddressFields) -> WireBuyer {
    WireBuyer {
        id: buyer.id.clone(),
        name: buyer.name.clone(),
        surname: buyer.surname.clone(),
        gsm_number: buyer.phone.clone(),
        email: buyer.email.clone(),
        identity_number: buyer.identity_number.clone(),
        registration_address: street(address),
        ip: buyer.ip.clone(),
        city: address.city.clone(),
        country: address.country.clone(),
        zip_code: address.postal_code.clone(),
    }
}

impl From<&BasketLine> for WireBasketItem {
    fn from(line: &BasketLine) -> Self {
        Self {
            id: line.id.clone(),
            name: line.name.clone(),
            category1: "General",
            item_type: "PHYSICAL",
            price: money(&line.price),
        }
    }
}

impl From<&PaymentRequest> for CreatePaymentRequest {
    fn from(request: &PaymentRequest) -> Self {
        Self {
            locale: request.locale.clone(),
            conversation_id: request.order_number.clone(),
            price: money(&request.price),
            paid_price: money(&request.paid_price),
            currency: request.currency.clone(),
            installment: 1,
            basket_id: request.order_number.clone(),
            payment_channel: "WEB",
            payment_group: "PRODUCT",
            callback_url: request.callback_url.clone(),
            payment_card: (&request.card).into(),
            buyer: wire_buyer(&request.buyer, &request.address),
            shipping_address: (&request.address).into(),
            billing_address: (&request.address).into(),
            basket_items: request.basket.iter().map(Into::into).collect(),
        }
    }
}
