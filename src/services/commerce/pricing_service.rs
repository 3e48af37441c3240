//! Cart pricing: line totals, promotion codes and rounded order totals.
//!
//! Everything here is a pure function of its inputs so the same request always
//! produces the same preview, with or without a database.

use crate::errors::ServiceError;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Share of the order total taken off by `HAPPYHOURS`, in percent
const HAPPY_HOURS_PERCENT: Decimal = dec!(18);

/// One cart line as submitted by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[validate(length(min = 1, max = 100))]
    pub product_sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255))]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub product_image: Option<String>,
    pub quantity: i32,
    /// Unit price
    #[serde(rename = "price")]
    #[schema(value_type = String, example = "6.50")]
    pub unit_price: Decimal,
    /// Absolute discount on the whole line
    #[serde(default)]
    #[schema(value_type = String, example = "0")]
    pub discount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl LineItem {
    pub fn new(product_sku: impl Into<String>, unit_price: Decimal, quantity: i32) -> Self {
        Self {
            product_sku: product_sku.into(),
            product_name: None,
            product_image: None,
            quantity,
            unit_price,
            discount: Decimal::ZERO,
            notes: None,
        }
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    /// `unit_price * quantity - discount`, after checking the line makes sense
    fn total(&self) -> Result<Decimal, ServiceError> {
        if self.quantity <= 0 {
            return Err(ServiceError::InvalidDiscount(format!(
                "quantity for {} must be greater than 0",
                self.product_sku
            )));
        }
        if self.unit_price.is_sign_negative() && !self.unit_price.is_zero() {
            return Err(ServiceError::InvalidDiscount(format!(
                "unit price for {} cannot be negative",
                self.product_sku
            )));
        }
        if self.discount.is_sign_negative() && !self.discount.is_zero() {
            return Err(ServiceError::InvalidDiscount(format!(
                "discount for {} cannot be negative",
                self.product_sku
            )));
        }

        let gross = self
            .unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| overflow(&self.product_sku))?;
        if self.discount > gross {
            return Err(ServiceError::InvalidDiscount(format!(
                "discount {} exceeds line total {} for {}",
                self.discount, gross, self.product_sku
            )));
        }

        Ok(gross - self.discount)
    }
}

/// Promotion codes the engine understands. Matching is on the uppercased code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum PromotionCode {
    /// 18% off the order total
    #[strum(serialize = "HAPPYHOURS")]
    HappyHours,
    /// Lowest priced unit for free
    #[strum(serialize = "BUYGETONE")]
    BuyGetOne,
}

impl PromotionCode {
    /// `None` for codes the engine does not know; those are ignored, not rejected.
    pub fn parse(code: &str) -> Option<Self> {
        Self::from_str(&code.to_uppercase()).ok()
    }

    pub fn kind(self) -> PromotionKind {
        match self {
            Self::HappyHours => PromotionKind::Percentage,
            Self::BuyGetOne => PromotionKind::FreeItem,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    Percentage,
    FreeItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromotionResult {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: PromotionKind,
    #[schema(value_type = String, example = "18.00")]
    pub discount_amount: Decimal,
    pub description: String,
    pub applied_to_items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricedLineItem {
    pub product_sku: String,
    pub product_name: Option<String>,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    #[schema(value_type = String)]
    pub discount: Decimal,
    #[schema(value_type = String)]
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartPreview {
    #[schema(value_type = String, example = "18.00")]
    pub total_discount: Decimal,
    #[schema(value_type = String, example = "100.00")]
    pub sub_total_amount: Decimal,
    #[schema(value_type = String, example = "82.00")]
    pub total_amount: Decimal,
    pub total_items: i64,
    pub currency: String,
    pub items: Vec<PricedLineItem>,
    pub promotions: Vec<PromotionResult>,
}

/// Two decimal places, halves away from zero
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.scale() < 2 {
        rounded.rescale(2);
    }
    rounded
}

fn overflow(sku: &str) -> ServiceError {
    ServiceError::BadRequest(format!("cart amounts for {} are out of range", sku))
}

/// Prices a cart.
///
/// Promotion codes apply in input order; a repeated code applies again.
/// Each promotion's discount is rounded before it is summed so the reported
/// promotions always add up to `total_discount`.
pub fn compute_preview(
    items: &[LineItem],
    promotion_codes: &[String],
    currency: Option<&str>,
) -> Result<CartPreview, ServiceError> {
    let mut sub_total = Decimal::ZERO;
    let mut total_items: i64 = 0;
    let mut priced = Vec::with_capacity(items.len());

    for item in items {
        let line_total = item.total()?;
        sub_total = sub_total
            .checked_add(line_total)
            .ok_or_else(|| overflow(&item.product_sku))?;
        total_items += i64::from(item.quantity);

        priced.push(PricedLineItem {
            product_sku: item.product_sku.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            price: item.unit_price,
            discount: item.discount,
            total_price: round_money(line_total),
        });
    }

    let promotions: Vec<PromotionResult> = promotion_codes
        .iter()
        .filter_map(|code| PromotionCode::parse(code))
        .map(|code| apply_promotion(code, items, sub_total))
        .collect();

    let total_discount = promotions.iter().try_fold(Decimal::ZERO, |acc, promotion| {
        acc.checked_add(promotion.discount_amount)
            .ok_or_else(|| overflow(&promotion.code))
    })?;
    let total_amount = (sub_total - total_discount).max(Decimal::ZERO);

    Ok(CartPreview {
        total_discount: round_money(total_discount),
        sub_total_amount: round_money(sub_total),
        total_amount: round_money(total_amount),
        total_items,
        currency: currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string(),
        items: priced,
        promotions,
    })
}

fn apply_promotion(code: PromotionCode, items: &[LineItem], sub_total: Decimal) -> PromotionResult {
    let name = code.to_string();
    match code {
        PromotionCode::HappyHours => PromotionResult {
            description: format!(
                "Discount code {} applies {}% discount to the order total",
                name, HAPPY_HOURS_PERCENT
            ),
            code: name,
            kind: code.kind(),
            discount_amount: round_money(sub_total / dec!(100) * HAPPY_HOURS_PERCENT),
            applied_to_items: items.iter().map(|i| i.product_sku.clone()).collect(),
        },
        PromotionCode::BuyGetOne => {
            // strict `<` keeps the first of equally cheap lines
            let cheapest = items.iter().fold(None::<&LineItem>, |lowest, item| match lowest {
                Some(l) if item.unit_price >= l.unit_price => Some(l),
                _ => Some(item),
            });

            PromotionResult {
                description: format!(
                    "Discount code {} gives the lowest priced item for free",
                    name
                ),
                code: name,
                kind: code.kind(),
                discount_amount: round_money(cheapest.map(|i| i.unit_price).unwrap_or_default()),
                applied_to_items: cheapest.map(|i| i.product_sku.clone()).into_iter().collect(),
            }
        }
    }
}
