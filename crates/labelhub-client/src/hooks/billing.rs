use super::{keys, Hooks};
use crate::api::types::{BillingRateCard, BillingReport, BillingReportFilter, ComputeProfile};
use crate::cache::Query;

impl Hooks {
    pub fn compute_profiles(&self) -> Query<Vec<ComputeProfile>> {
        self.query(keys::compute_profiles(), |client| async move {
            client.list_compute_profiles().await
        })
    }

    pub fn billing_rate_cards(&self) -> Query<Vec<BillingRateCard>> {
        self.query(keys::billing_rate_cards(), |client| async move {
            client.list_billing_rate_cards().await
        })
    }

    /// Report for a date range; disabled while the range is inverted
    pub fn billing_report(&self, filter: &BillingReportFilter) -> Query<BillingReport> {
        let enabled = filter.from <= filter.to;
        let owned = filter.clone();
        self.query(keys::billing_report(filter), move |client| {
            let filter = owned.clone();
            async move { client.get_billing_report(&filter).await }
        })
        .enabled(enabled)
    }
}
