use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::Validate;

use crate::error::{Error, Result};

/// `tipo` of catalog items offered in the medications section.
pub const TIPO_MEDICAMENTO: &str = "Medicamento";
/// `tipo` of catalog items offered in the IV therapy section.
pub const TIPO_SOLUCION: &str = "Solucion";

/// Scale and precision of the `importe` column, numeric(8, 2).
pub const IMPORTE_SCALE: u32 = 2;
const IMPORTE_PRECISION: u32 = 8;

/// Priced catalog entry (producto/servicio).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductoServicio {
    pub id: i64,
    pub tipo: String,
    pub subtipo: String,
    pub codigo_prestacion: String,
    pub nombre_prestacion: String,
    pub importe: Decimal,
    pub cantidad: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProductoServicio {
    #[validate(length(min = 1, max = 255))]
    pub tipo: String,
    #[validate(length(min = 1, max = 255))]
    pub subtipo: String,
    #[validate(length(min = 1, max = 255))]
    pub codigo_prestacion: String,
    #[validate(length(min = 1, max = 200))]
    pub nombre_prestacion: String,
    pub importe: Decimal,
    pub cantidad: Option<i32>,
}

impl NewProductoServicio {
    /// Validates the payload and returns it with `importe` at scale 2.
    pub fn normalized(mut self) -> Result<Self> {
        self.validate()?;
        self.importe = normalize_importe(self.importe)?;
        Ok(self)
    }
}

/// Brings an amount to exactly two fractional digits, rejecting values that
/// would lose precision or overflow numeric(8, 2).
pub fn normalize_importe(value: Decimal) -> Result<Decimal> {
    let mut amount = value.normalize();
    if amount.scale() > IMPORTE_SCALE {
        return Err(Error::validation(
            "importe",
            "at most two fractional digits are allowed",
        ));
    }
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::validation("importe", "must not be negative"));
    }
    let limit = Decimal::from(10_i64.pow(IMPORTE_PRECISION - IMPORTE_SCALE));
    if amount >= limit {
        return Err(Error::validation("importe", "exceeds numeric(8,2)"));
    }
    amount.rescale(IMPORTE_SCALE);
    Ok(amount)
}

/// Filter for catalog listings, borrowed from query strings when possible.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter<'a> {
    pub tipo: Option<Cow<'a, str>>,
    pub subtipo: Option<Cow<'a, str>>,
}

impl<'a> CatalogFilter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tipo<S: Into<Cow<'a, str>>>(mut self, tipo: S) -> Self {
        self.tipo = Some(tipo.into());
        self
    }

    pub fn with_subtipo<S: Into<Cow<'a, str>>>(mut self, subtipo: S) -> Self {
        self.subtipo = Some(subtipo.into());
        self
    }

    pub fn medicamentos() -> Self {
        Self::new().with_tipo(TIPO_MEDICAMENTO)
    }

    pub fn soluciones() -> Self {
        Self::new().with_tipo(TIPO_SOLUCION)
    }

    pub fn matches(&self, item: &ProductoServicio) -> bool {
        self.tipo.as_deref().map_or(true, |t| item.tipo == t)
            && self.subtipo.as_deref().map_or(true, |s| item.subtipo == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn paracetamol() -> NewProductoServicio {
        NewProductoServicio {
            tipo: "Medicamento".into(),
            subtipo: "Oral".into(),
            codigo_prestacion: "M001".into(),
            nombre_prestacion: "Paracetamol 500mg".into(),
            importe: Decimal::from_str("12.5").unwrap(),
            cantidad: None,
        }
    }

    #[test]
    fn test_importe_gets_two_fractional_digits() {
        let item = paracetamol().normalized().unwrap();
        assert_eq!(item.importe.to_string(), "12.50");
        assert_eq!(item.importe.scale(), 2);
        assert!(item.cantidad.is_none());
    }

    #[test]
    fn test_importe_trailing_zeros_are_not_precision() {
        let amount = normalize_importe(Decimal::from_str("7.000").unwrap()).unwrap();
        assert_eq!(amount.to_string(), "7.00");
    }

    #[test]
    fn test_importe_rejects_extra_precision() {
        assert!(normalize_importe(Decimal::from_str("12.505").unwrap()).is_err());
        assert!(normalize_importe(Decimal::from_str("1000000.00").unwrap()).is_err());
        assert!(normalize_importe(Decimal::from_str("999999.99").unwrap()).is_ok());
        assert!(normalize_importe(Decimal::from_str("-1").unwrap()).is_err());
    }

    #[test]
    fn test_nombre_prestacion_limit() {
        let mut item = paracetamol();
        item.nombre_prestacion = "x".repeat(201);
        assert!(item.normalized().is_err());
    }

    #[test]
    fn test_importe_serializes_as_string() {
        let item = ProductoServicio {
            id: 1,
            tipo: "Medicamento".into(),
            subtipo: "Oral".into(),
            codigo_prestacion: "M001".into(),
            nombre_prestacion: "Paracetamol 500mg".into(),
            importe: normalize_importe(Decimal::from_str("12.5").unwrap()).unwrap(),
            cantidad: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["importe"], "12.50");
        assert!(json["cantidad"].is_null());
    }

    #[test]
    fn test_filter_matches() {
        let item = ProductoServicio {
            id: 3,
            tipo: "Solucion".into(),
            subtipo: "Cristaloide".into(),
            codigo_prestacion: "S010".into(),
            nombre_prestacion: "Solución salina 0.9% 1000ml".into(),
            importe: Decimal::new(8500, 2),
            cantidad: Some(10),
        };
        assert!(CatalogFilter::soluciones().matches(&item));
        assert!(!CatalogFilter::medicamentos().matches(&item));
        assert!(CatalogFilter::new().with_subtipo("Cristaloide").matches(&item));
    }
}
