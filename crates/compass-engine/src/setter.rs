//! Retry-based property application
//!
//! The host's property surface after a swap is eventually consistent:
//! sub-instances materialize lazily and references can go stale mid-write.
//! Each application therefore re-enumerates the subtree, writes, verifies
//! by reading back, and retries transient failures a bounded number of
//! times before demoting the property to a warning.

use crate::subtree::SubtreeView;
use compass_host::{DocumentHost, HostError, PropertyValue};
use compass_mapper::{LogicalProperty, PropertyTable};
use std::time::Duration;

pub(crate) struct PropertySetter<'a, H> {
    host: &'a H,
    table: &'a PropertyTable,
    max_retries: u32,
    retry_delay: Duration,
}

impl<'a, H: DocumentHost> PropertySetter<'a, H> {
    pub(crate) fn new(
        host: &'a H,
        table: &'a PropertyTable,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            host,
            table,
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    /// Apply one logical property, returning a warning message on failure
    ///
    /// Never returns an error: property application is recoverable by
    /// contract, the instance migration continues either way.
    pub(crate) async fn apply(
        &self,
        view: &mut SubtreeView,
        logical: LogicalProperty,
        value: PropertyValue,
    ) -> Option<String> {
        let label = self.describe(logical);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_exact(view, logical, &value).await {
                Ok(true) => return None,
                Ok(false) => break,
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    tracing::debug!(property = %label, attempt, error = %e, "retrying property write");
                    view.invalidate();
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    return Some(format!(
                        "could not set {label} after {attempt} attempt(s): {e}"
                    ));
                }
            }
        }

        // No exact candidate exists anywhere in the subtree; one fuzzy
        // pass against whatever property names are actually present.
        match self.try_fuzzy(view, logical, &value).await {
            Ok(true) => None,
            Ok(false) => Some(format!("no property matching {label} found on target")),
            Err(e) => Some(format!("could not set {label}: {e}")),
        }
    }

    /// Write the first exact candidate found on any sub-instance
    ///
    /// `Ok(false)` means no node exposes any candidate name.
    async fn try_exact(
        &self,
        view: &mut SubtreeView,
        logical: LogicalProperty,
        value: &PropertyValue,
    ) -> Result<bool, HostError> {
        let nodes = view.nodes(self.host).await?.to_vec();
        for candidate in self.table.candidates(logical) {
            for node in &nodes {
                let props = self.host.component_properties(&node.id).await?;
                if !props.contains_key(candidate) {
                    continue;
                }
                self.host
                    .set_property(&node.id, candidate, value.clone())
                    .await?;
                let written = self.host.get_property(&node.id, candidate).await?;
                if &written != value {
                    return Err(HostError::Stale(format!(
                        "read-back mismatch on {candidate}"
                    )));
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Single best-effort pass over fuzzy name matches
    async fn try_fuzzy(
        &self,
        view: &mut SubtreeView,
        logical: LogicalProperty,
        value: &PropertyValue,
    ) -> Result<bool, HostError> {
        let nodes = view.nodes(self.host).await?.to_vec();
        for node in &nodes {
            let props = self.host.component_properties(&node.id).await?;
            if let Some(name) = props.keys().find(|name| logical.fuzzy_matches(name)) {
                tracing::debug!(node = %node.id, property = %name, "applying via fuzzy name match");
                self.host
                    .set_property(&node.id, name, value.clone())
                    .await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Human-readable property name for warnings (primary physical name)
    fn describe(&self, logical: LogicalProperty) -> String {
        self.table
            .candidates(logical)
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{logical:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_test_utils::FakeHost;
    use std::collections::BTreeMap;

    fn host_with_label(label_property: &str) -> (FakeHost, compass_host::NodeId) {
        let host = FakeHost::new();
        let page = host.first_page();
        let mut props = BTreeMap::new();
        props.insert(
            label_property.to_string(),
            PropertyValue::Text(String::new()),
        );
        let id = host.add_instance(&page, "node", None, BTreeMap::new(), props);
        (host, id)
    }

    #[tokio::test]
    async fn transient_failures_retry_then_succeed() {
        let (host, id) = host_with_label("Action Text#12254:9");
        host.fail_set_property("Action Text#12254:9", 2);

        let table = PropertyTable::action();
        let setter = PropertySetter::new(&host, &table, 3, Duration::from_millis(1));
        let mut view = SubtreeView::new(id.clone());

        let warning = setter
            .apply(
                &mut view,
                LogicalProperty::Label,
                PropertyValue::Text("Go".into()),
            )
            .await;
        assert_eq!(warning, None);
        assert_eq!(
            host.get_property(&id, "Action Text#12254:9").await.unwrap(),
            PropertyValue::Text("Go".into())
        );
    }

    #[tokio::test]
    async fn exhaustion_demotes_to_warning() {
        let (host, id) = host_with_label("Action Text#12254:9");
        host.fail_set_property("Action Text#12254:9", u32::MAX);

        let table = PropertyTable::action();
        let setter = PropertySetter::new(&host, &table, 3, Duration::from_millis(1));
        let mut view = SubtreeView::new(id);

        let warning = setter
            .apply(
                &mut view,
                LogicalProperty::Label,
                PropertyValue::Text("Go".into()),
            )
            .await
            .expect("exhaustion warns");
        assert!(warning.contains("Action Text#12254:9"));
        assert!(warning.contains("3 attempt(s)"));
    }

    #[tokio::test]
    async fn fuzzy_pass_handles_renamed_properties() {
        // Target exposes a differently suffixed label property.
        let (host, id) = host_with_label("Label Text#77:0");

        let table = PropertyTable::action();
        let setter = PropertySetter::new(&host, &table, 3, Duration::from_millis(1));
        let mut view = SubtreeView::new(id.clone());

        let warning = setter
            .apply(
                &mut view,
                LogicalProperty::Label,
                PropertyValue::Text("Go".into()),
            )
            .await;
        assert_eq!(warning, None);
        assert_eq!(
            host.get_property(&id, "Label Text#77:0").await.unwrap(),
            PropertyValue::Text("Go".into())
        );
    }

    #[tokio::test]
    async fn missing_everywhere_warns_without_error() {
        let (host, id) = host_with_label("Unrelated#1:1");

        let table = PropertyTable::action();
        let setter = PropertySetter::new(&host, &table, 3, Duration::from_millis(1));
        let mut view = SubtreeView::new(id);

        let warning = setter
            .apply(
                &mut view,
                LogicalProperty::ShowLeftIcon,
                PropertyValue::Bool(true),
            )
            .await
            .expect("nothing to set");
        assert!(warning.contains("Show 'Left icon'"));
    }
}
