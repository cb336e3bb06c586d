//! Order totals, computed server-side from catalog prices.
//!
//! The client also declares a total at checkout; that figure is advisory
//! only and the gateway is always charged the server-computed amount.

/// One purchasable line: authoritative unit price and requested quantity.
#[derive(Clone, Copy, Debug)]
pub struct PricedLine {
    pub unit_price: f64,
    pub quantity: i32,
}

pub fn order_total(lines: &[PricedLine]) -> f64 {
    lines.iter().map(|l| l.unit_price * f64::from(l.quantity)).sum()
}

/// Gateway amount in minor currency units.
pub fn to_minor_units(total: f64) -> i64 {
    (total * 100.0).round() as i64
}

/// True when the client-declared total disagrees with the server total by
/// more than a cent.
pub fn price_mismatch(declared: f64, computed: f64) -> bool {
    (declared - computed).abs() > 0.01
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_price_times_quantity() {
        // Two of A at 100; B is unselected so the client never submits it.
        let lines = [PricedLine { unit_price: 100.0, quantity: 2 }];
        assert_eq!(order_total(&lines), 200.0);
        assert_eq!(to_minor_units(order_total(&lines)), 20_000);
    }

    #[test]
    fn total_of_no_lines_is_zero() {
        assert_eq!(order_total(&[]), 0.0);
    }

    #[test]
    fn minor_units_round_half_cents() {
        assert_eq!(to_minor_units(19.999), 2000);
        assert_eq!(to_minor_units(0.014), 1);
    }

    #[test]
    fn mismatch_tolerates_a_cent() {
        assert!(!price_mismatch(200.0, 200.009));
        assert!(price_mismatch(199.0, 200.0));
    }
}
