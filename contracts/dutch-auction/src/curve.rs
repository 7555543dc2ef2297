use concordium_std::*;

/// Linear price decay from `start_price` at `start` to `reserve_price` at
/// `start + duration`. Prices are in CCD per smallest token unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct PriceCurve {
    /// Sale window opening time.
    pub start: Timestamp,
    /// Sale window length. The window is `[start, start + duration)`.
    pub duration: Duration,
    /// Unit price at `start`.
    pub start_price: Amount,
    /// Unit price at and after the end of the window.
    pub reserve_price: Amount,
}

impl PriceCurve {
    pub fn is_valid(&self) -> bool {
        self.duration.millis() > 0
            && self.start_price > Amount::zero()
            && self.reserve_price <= self.start_price
            && self.end().is_some()
    }

    /// First instant after the sale window.
    pub fn end(&self) -> Option<Timestamp> {
        self.start.checked_add(self.duration)
    }

    /// Milliseconds since `start`, `None` before it.
    fn elapsed(&self, now: Timestamp) -> Option<u64> {
        now.timestamp_millis()
            .checked_sub(self.start.timestamp_millis())
    }

    pub fn has_started(&self, now: Timestamp) -> bool {
        self.elapsed(now).is_some()
    }

    pub fn has_ended(&self, now: Timestamp) -> bool {
        self.elapsed(now)
            .map(|elapsed| elapsed >= self.duration.millis())
            .unwrap_or(false)
    }

    /// Unit price at `now`.
    ///
    /// The discount is floored, so the price never drops below the exact linear
    /// value and stays within `[reserve_price, start_price]`. Before `start` the
    /// start price is returned; callers decide whether the sale is open.
    pub fn price_at(&self, now: Timestamp) -> Amount {
        let elapsed = match self.elapsed(now) {
            Some(elapsed) => elapsed,
            None => return self.start_price,
        };
        let duration = self.duration.millis();
        if elapsed >= duration {
            return self.reserve_price;
        }

        let spread = self
            .start_price
            .micro_ccd
            .saturating_sub(self.reserve_price.micro_ccd);
        // elapsed < duration, so the discount is strictly below the spread
        let discount = spread as u128 * elapsed as u128 / duration as u128;

        Amount::from_micro_ccd(self.start_price.micro_ccd - discount as u64)
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;

    const START_MILLIS: u64 = 1_000_000;
    const DURATION_SECONDS: u64 = 3600;

    fn at(seconds: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(START_MILLIS + seconds * 1000)
    }

    fn curve() -> PriceCurve {
        PriceCurve {
            start: at(0),
            duration: Duration::from_seconds(DURATION_SECONDS),
            start_price: Amount::from_micro_ccd(1000),
            reserve_price: Amount::from_micro_ccd(200),
        }
    }

    #[concordium_test]
    fn test_boundary_prices() {
        let curve = curve();

        claim_eq!(curve.price_at(at(0)), curve.start_price);
        claim_eq!(curve.price_at(at(DURATION_SECONDS)), curve.reserve_price);
        claim_eq!(curve.price_at(at(DURATION_SECONDS * 5)), curve.reserve_price);
        claim_eq!(
            curve.price_at(Timestamp::from_timestamp_millis(START_MILLIS - 1)),
            curve.start_price
        );
    }

    #[concordium_test]
    fn test_midpoint_price() {
        let curve = curve();

        // 1000 - 800 * 1800 / 3600
        claim_eq!(
            curve.price_at(at(DURATION_SECONDS / 2)),
            Amount::from_micro_ccd(600)
        );
    }

    #[concordium_test]
    fn test_discount_is_floored() {
        let curve = PriceCurve {
            start: at(0),
            duration: Duration::from_seconds(3),
            start_price: Amount::from_micro_ccd(10),
            reserve_price: Amount::from_micro_ccd(9),
        };

        // Exact values are 9.67 and 9.33, the floored discount keeps 10
        claim_eq!(curve.price_at(at(1)), Amount::from_micro_ccd(10));
        claim_eq!(curve.price_at(at(2)), Amount::from_micro_ccd(10));
        claim_eq!(curve.price_at(at(3)), Amount::from_micro_ccd(9));
    }

    #[concordium_test]
    fn test_price_is_monotonic_and_bounded() {
        let curves = [
            curve(),
            PriceCurve {
                start: at(0),
                duration: Duration::from_millis(7),
                start_price: Amount::from_ccd(1_000_000),
                reserve_price: Amount::zero(),
            },
            PriceCurve {
                start: at(0),
                duration: Duration::from_seconds(DURATION_SECONDS),
                start_price: Amount::from_micro_ccd(u64::MAX),
                reserve_price: Amount::from_micro_ccd(1),
            },
            PriceCurve {
                start: at(0),
                duration: Duration::from_seconds(60),
                start_price: Amount::from_micro_ccd(500),
                reserve_price: Amount::from_micro_ccd(500),
            },
        ];

        for curve in curves.iter() {
            let duration = curve.duration.millis();
            let step = core::cmp::max(duration / 997, 1);
            let mut previous = curve.price_at(curve.start);
            let mut offset = 0;
            while offset <= duration + step {
                let now = Timestamp::from_timestamp_millis(START_MILLIS + offset);
                let price = curve.price_at(now);
                claim!(price <= previous, "Price must not increase over time");
                claim!(price >= curve.reserve_price);
                claim!(price <= curve.start_price);
                previous = price;
                offset += step;
            }
        }
    }

    #[concordium_test]
    fn test_window() {
        let curve = curve();

        claim!(!curve.has_started(Timestamp::from_timestamp_millis(START_MILLIS - 1)));
        claim!(curve.has_started(at(0)));
        claim!(!curve.has_ended(at(DURATION_SECONDS - 1)));
        claim!(curve.has_ended(at(DURATION_SECONDS)));
        claim_eq!(curve.end(), Some(at(DURATION_SECONDS)));
    }

    #[concordium_test]
    fn test_validation() {
        claim!(curve().is_valid());

        let mut inverted = curve();
        inverted.reserve_price = Amount::from_micro_ccd(1001);
        claim!(!inverted.is_valid());

        let mut instant = curve();
        instant.duration = Duration::from_millis(0);
        claim!(!instant.is_valid());

        let mut free = curve();
        free.start_price = Amount::zero();
        free.reserve_price = Amount::zero();
        claim!(!free.is_valid());
    }
}
