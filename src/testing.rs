//! In-memory doubles for the repository and gateway ports.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::web;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::application::discount_service::DiscountService;
use crate::application::order_service::OrderService;
use crate::application::payment_service::{PaymentService, PaymentSettings};
use crate::domain::assembler::{OrderAssembler, VariantSnapshot};
use crate::domain::discount::{Applicability, DiscountCode, RedemptionPolicy};
use crate::domain::errors::DomainError;
use crate::domain::gateway::{BinInfo, PaymentCard, PaymentRequest, PaymentResult, ThreeDsCompletion};
use crate::domain::order::{
    confirmation_of, AddressFields, AddressRef, BankTransferNotice, Confirmation, ListResult,
    OrderItemInput, OrderItemView, OrderStatus, OrderView, PaymentType, PlaceOrder, PlacedOrder, StatusTransition,
};
use crate::domain::ports::{DiscountRepository, OrderRepository, PaymentGateway};
use crate::infrastructure::cart_store::CartStore;
use crate::AppState;

pub const THREE_DS_HTML: &str = "<!doctype html><html><body onload=\"document.forms[0].submit()\">\
<form action=\"https://sandbox-api.iyzipay.com/payment/mock/init3ds\" method=\"POST\">\
<input type=\"hidden\" name=\"token\" value=\"c5f1b2e7\"></form></body></html>";

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal")
}

pub fn address() -> AddressFields {
    AddressFields {
        full_name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
        phone: "+905551112233".into(),
        line1: "Bagdat Cd. 12".into(),
        line2: None,
        city: "Istanbul".into(),
        district: Some("Kadikoy".into()),
        postal_code: "34710".into(),
        country: "Turkey".into(),
    }
}

pub fn guest_order(variants: &[Uuid]) -> PlaceOrder {
    PlaceOrder {
        customer_id: None,
        address: AddressRef::Inline(address()),
        items: variants
            .iter()
            .map(|&variant_id| OrderItemInput {
                variant_id,
                quantity: 1,
            })
            .collect(),
        discount_code: None,
        payment_type: PaymentType::Card,
    }
}

pub fn card() -> PaymentCard {
    PaymentCard {
        holder_name: "Ada Lovelace".into(),
        number: "5528790000000008".into(),
        expire_month: "12".into(),
        expire_year: "2030".into(),
        cvc: "123".into(),
    }
}

#[derive(Default)]
struct State {
    variants: HashMap<Uuid, VariantSnapshot>,
    discounts: HashMap<String, (DiscountCode, bool)>,
    addresses: HashMap<Uuid, (Uuid, AddressFields)>,
    orders: Vec<OrderView>,
    notices: Vec<(String, BankTransferNotice)>,
}

/// Catalog, discount and order tables behind one lock, so `place` is atomic.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn add_variant(&self, price: &str, discount_percent: &str, tax_rate: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().variants.insert(
            id,
            VariantSnapshot {
                id,
                sku: format!("SKU-{}", &id.simple().to_string()[..6]),
                name: "Single origin beans".into(),
                price: dec(price),
                discount_percent: dec(discount_percent),
                tax_rate: dec(tax_rate),
                is_published: true,
                deleted_at: None,
                product_active: true,
            },
        );
        id
    }

    pub fn soft_delete_variant(&self, id: Uuid) {
        if let Some(v) = self.state.lock().unwrap().variants.get_mut(&id) {
            v.deleted_at = Some(Utc::now());
        }
    }

    pub fn add_discount(&self, code: &str, discount_type: &str, amount: &str, variants: Option<Vec<Uuid>>) {
        let discount = DiscountCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            discount_type: discount_type.parse().unwrap(),
            amount: dec(amount),
            applicability: match variants {
                None => Applicability::All,
                Some(ids) => Applicability::Variants(ids.into_iter().collect::<HashSet<_>>()),
            },
            max_uses: None,
            times_used: 0,
        };
        self.state
            .lock()
            .unwrap()
            .discounts
            .insert(code.to_string(), (discount, true));
    }

    pub fn retire_discount(&self, code: &str) {
        if let Some(entry) = self.state.lock().unwrap().discounts.get_mut(code) {
            entry.1 = false;
        }
    }

    pub fn limit_discount(&self, code: &str, max_uses: i32) {
        if let Some(entry) = self.state.lock().unwrap().discounts.get_mut(code) {
            entry.0.max_uses = Some(max_uses);
        }
    }

    pub fn times_used(&self, code: &str) -> i32 {
        self.state.lock().unwrap().discounts[code].0.times_used
    }

    pub fn add_address(&self, customer_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.state
            .lock()
            .unwrap()
            .addresses
            .insert(id, (customer_id, address()));
        id
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn status_of(&self, order_number: &str) -> OrderStatus {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.order_number == order_number)
            .map(|o| o.status)
            .expect("order exists")
    }

    pub fn notice_count(&self, order_number: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .notices
            .iter()
            .filter(|(n, _)| n == order_number)
            .count()
    }
}

impl OrderRepository for InMemoryStore {
    fn place(&self, request: &PlaceOrder, assembler: &OrderAssembler) -> Result<PlacedOrder, DomainError> {
        let mut state = self.state.lock().unwrap();

        let address = match &request.address {
            AddressRef::Inline(fields) => fields.clone(),
            AddressRef::ById(id) => state
                .addresses
                .get(id)
                .filter(|(owner, _)| Some(*owner) == request.customer_id)
                .map(|(_, a)| a.clone())
                .ok_or(DomainError::AddressNotFound)?,
        };
        let variants: Vec<VariantSnapshot> = request
            .items
            .iter()
            .filter_map(|i| state.variants.get(&i.variant_id).cloned())
            .collect();
        let discount = request
            .discount_code
            .as_ref()
            .and_then(|c| state.discounts.get(c))
            .filter(|(_, active)| *active)
            .map(|(d, _)| d.clone());

        let order = assembler.assemble(request, address, &variants, discount.as_ref(), Utc::now())?;

        if let Some(code) = &order.discount_code {
            if order.redeemed_discount_id.is_some() {
                if let Some(entry) = state.discounts.get_mut(code) {
                    entry.0.times_used += 1;
                }
            }
        }

        let id = Uuid::new_v4();
        state.orders.push(OrderView {
            id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            status: order.status,
            payment_type: order.payment_type,
            subtotal: order.subtotal.clone(),
            discount_total: order.discount_total.clone(),
            total: order.total.clone(),
            price_at_gateway: order.price_at_gateway().clone(),
            discount_code: order.discount_code.clone(),
            gateway_payment_id: None,
            created_at: Utc::now(),
            address: Some(order.address.clone()),
            items: order
                .items
                .iter()
                .map(|i| OrderItemView {
                    variant_id: i.variant_id,
                    sku: i.sku.clone(),
                    name: i.name.clone(),
                    unit_price: i.unit_price.clone(),
                    discount_percent: i.discount_percent.clone(),
                    tax_rate: i.tax_rate.clone(),
                    quantity: i.quantity,
                    final_price: i.final_price.clone(),
                    line_total: i.line_total.clone(),
                })
                .collect(),
        });

        Ok(PlacedOrder {
            order_id: id,
            order_number: order.order_number,
        })
    }

    fn find_by_number(&self, order_number: &str) -> Result<Option<OrderView>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let state = self.state.lock().unwrap();
        let items = state
            .orders
            .iter()
            .rev()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(ListResult {
            items,
            total: state.orders.len() as i64,
        })
    }

    fn transition(&self, order_number: &str, transition: StatusTransition) -> Result<OrderStatus, DomainError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.order_number == order_number)
            .ok_or(DomainError::NotFound("Order"))?;
        order.status = order.status.apply(transition)?;
        Ok(order.status)
    }

    fn confirm_payment(&self, order_number: &str, gateway_payment_id: &str) -> Result<Confirmation, DomainError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.order_number == order_number)
            .ok_or(DomainError::NotFound("Order"))?;
        if !OrderStatus::CONFIRMABLE.contains(&order.status) {
            return confirmation_of(
                order_number,
                order.status,
                order.gateway_payment_id.as_deref(),
                gateway_payment_id,
            );
        }
        order.status = OrderStatus::Paid;
        order.gateway_payment_id = Some(gateway_payment_id.to_string());
        Ok(Confirmation::Confirmed)
    }

    fn add_bank_transfer_notice(&self, order_number: &str, notice: &BankTransferNotice) -> Result<Uuid, DomainError> {
        let mut state = self.state.lock().unwrap();
        if !state.orders.iter().any(|o| o.order_number == order_number) {
            return Err(DomainError::NotFound("Order"));
        }
        state.notices.push((order_number.to_string(), notice.clone()));
        Ok(Uuid::new_v4())
    }
}

impl DiscountRepository for InMemoryStore {
    fn find_by_code(&self, code: &str) -> Result<Option<DiscountCode>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .discounts
            .get(code)
            .filter(|(_, active)| *active)
            .map(|(d, _)| d.clone()))
    }
}

/// Gateway double. Results echo `settle_as` when set, otherwise leave basket
/// and amount empty so they are not checked.
#[derive(Default)]
pub struct FakeGateway {
    failure: Option<DomainError>,
    settled: Mutex<Option<(String, BigDecimal)>>,
    requests: Mutex<Vec<PaymentRequest>>,
    auth_calls: AtomicUsize,
    bin_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn rejecting(code: &str, message: &str) -> Self {
        Self {
            failure: Some(DomainError::Gateway {
                code: code.into(),
                message: message.into(),
            }),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            failure: Some(DomainError::GatewayUnavailable("connection refused".into())),
            ..Default::default()
        }
    }

    pub fn settle_as(&self, basket_id: &str, paid_price: &str) {
        *self.settled.lock().unwrap() = Some((basket_id.to_string(), dec(paid_price)));
    }

    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn bin_calls(&self) -> usize {
        self.bin_calls.load(Ordering::SeqCst)
    }

    fn outcome(&self, payment_id: &str) -> Result<PaymentResult, DomainError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let settled = self.settled.lock().unwrap().clone();
        Ok(PaymentResult {
            payment_id: payment_id.to_string(),
            basket_id: settled.as_ref().map(|(b, _)| b.clone()),
            paid_price: settled.map(|(_, p)| p),
            currency: Some("TRY".into()),
            fraud_status: Some(1),
        })
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize_three_ds(&self, request: &PaymentRequest) -> Result<String, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(THREE_DS_HTML.to_string()),
        }
    }

    async fn complete_three_ds(&self, completion: &ThreeDsCompletion) -> Result<PaymentResult, DomainError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome(&completion.payment_id)
    }

    async fn authorize(&self, request: &PaymentRequest) -> Result<PaymentResult, DomainError> {
        self.requests.lock().unwrap().push(request.clone());
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome("pay-direct-1")
    }

    async fn check_bin(&self, bin_number: &str) -> Result<BinInfo, DomainError> {
        self.bin_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(BinInfo {
            bin_number: bin_number.to_string(),
            card_type: Some("CREDIT_CARD".into()),
            card_association: Some("MASTER_CARD".into()),
            card_family: Some("Paraf".into()),
            bank_name: Some("Halkbank".into()),
            commercial: Some(false),
        })
    }

    async fn payment_detail(&self, payment_id: &str) -> Result<PaymentResult, DomainError> {
        self.outcome(payment_id)
    }
}

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const STOREFRONT_URL: &str = "https://shop.example.com";

/// Handler state wired to the doubles, default redemption policy.
pub fn app_state(store: Arc<InMemoryStore>, gateway: Arc<FakeGateway>) -> web::Data<AppState> {
    let settings = PaymentSettings {
        currency: "TRY".into(),
        locale: "tr".into(),
        callback_url: format!("{STOREFRONT_URL}/payments/3ds/callback"),
    };
    web::Data::new(AppState {
        orders: OrderService::new(store.clone(), OrderAssembler::default()),
        discounts: DiscountService::new(store.clone(), RedemptionPolicy::default()),
        payments: PaymentService::new(store, gateway, settings),
        carts: CartStore::new(),
        admin_token: ADMIN_TOKEN.to_string(),
        storefront_url: STOREFRONT_URL.to_string(),
    })
}
