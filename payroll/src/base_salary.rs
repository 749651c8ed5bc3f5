use std::collections::HashMap;

/// Fixed designation → base-amount mapping, seeded once at engine
/// construction and never written afterwards.
#[derive(Clone, Debug)]
pub struct BaseSalaryTable {
    rates: HashMap<String, f64>,
}

impl BaseSalaryTable {
    /// The standard rate card.
    pub fn standard() -> Self {
        Self::from_rates([
            ("Manager", 30_000.00),
            ("HR", 20_000.00),
            ("JuniorEngineer", 15_000.00),
            ("SeniorEngineer", 30_000.00),
            ("Tester", 25_000.00),
            ("Analyst", 25_000.00),
        ])
    }

    pub fn from_rates<I, K>(rates: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            rates: rates
                .into_iter()
                .map(|(role, amount)| (role.into(), amount))
                .collect(),
        }
    }

    /// Base amount for a designation. Lookup is exact; callers convert the
    /// missing branch into their own error kind.
    pub fn base_for(&self, designation: &str) -> Option<f64> {
        self.rates.get(designation).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_covers_the_six_roles() {
        let table = BaseSalaryTable::standard();
        assert_eq!(table.base_for("Manager"), Some(30_000.00));
        assert_eq!(table.base_for("HR"), Some(20_000.00));
        assert_eq!(table.base_for("JuniorEngineer"), Some(15_000.00));
        assert_eq!(table.base_for("SeniorEngineer"), Some(30_000.00));
        assert_eq!(table.base_for("Tester"), Some(25_000.00));
        assert_eq!(table.base_for("Analyst"), Some(25_000.00));
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let table = BaseSalaryTable::standard();
        assert_eq!(table.base_for("manager"), None);
        assert_eq!(table.base_for("Wizard"), None);
    }
}
