//! Plugin Aggregator
//!
//! Collects the filter and output directives selected by one fragment at
//! cluster and namespace scope and merges them: namespace-scoped entries first,
//! cluster-scoped entries after. Within a scope, matched resources are ordered
//! by identity so the result never depends on listing order.

use crate::error::{CompileError, StoreError};
use crate::global::{AggregatedCfgResources, RouteMatch};
use crate::model::{ConfigFragment, ParamValue, PluginDirective, PluginKind};
use crate::selector::Selector;
use crate::store::{ObjectStore, SecretLoader};
use crate::types::{ObjectRef, Scope};

/// Compiled filter and output selectors of one fragment.
#[derive(Debug, Clone)]
pub struct FragmentSelectors {
    pub filter: Selector,
    pub output: Selector,
}

impl FragmentSelectors {
    fn for_kind(&self, kind: PluginKind) -> &Selector {
        match kind {
            PluginKind::Filter => &self.filter,
            PluginKind::Output => &self.output,
        }
    }
}

/// Outcome of aggregating one fragment.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub resources: AggregatedCfgResources,
    /// Plugin resources that contributed, in merge order
    pub matched: Vec<ObjectRef>,
    /// Fragment-scoped problems; the affected directives were dropped
    pub errors: Vec<String>,
}

#[derive(Debug, Default)]
struct Collected {
    directives: Vec<PluginDirective>,
    matched: Vec<ObjectRef>,
    errors: Vec<String>,
}

pub struct PluginAggregator<'a> {
    store: &'a dyn ObjectStore,
    secrets: &'a dyn SecretLoader,
    /// Namespace secrets are resolved in (the agent's)
    secret_namespace: &'a str,
}

impl<'a> PluginAggregator<'a> {
    pub fn new(store: &'a dyn ObjectStore, secrets: &'a dyn SecretLoader, secret_namespace: &'a str) -> Self {
        Self {
            store,
            secrets,
            secret_namespace,
        }
    }

    /// Aggregate `fragment`'s directives. Only transient store failures are
    /// returned as `Err`; everything else lands in [`Aggregation::errors`].
    pub fn aggregate(
        &self,
        fragment: &ConfigFragment,
        selectors: &FragmentSelectors,
        route: RouteMatch,
    ) -> Result<Aggregation, CompileError> {
        let cluster_filters = self.collect(fragment, selectors, PluginKind::Filter, Scope::Cluster)?;
        let cluster_outputs = self.collect(fragment, selectors, PluginKind::Output, Scope::Cluster)?;

        let (ns_filters, ns_outputs) = match fragment.scope {
            Scope::Namespaced => (
                self.collect(fragment, selectors, PluginKind::Filter, Scope::Namespaced)?,
                self.collect(fragment, selectors, PluginKind::Output, Scope::Namespaced)?,
            ),
            Scope::Cluster => (Collected::default(), Collected::default()),
        };

        let mut aggregation = Aggregation {
            resources: AggregatedCfgResources {
                route,
                filters: Vec::new(),
                outputs: Vec::new(),
            },
            ..Default::default()
        };
        for (collected, is_filter) in [
            (ns_filters, true),
            (cluster_filters, true),
            (ns_outputs, false),
            (cluster_outputs, false),
        ] {
            let target = if is_filter {
                &mut aggregation.resources.filters
            } else {
                &mut aggregation.resources.outputs
            };
            target.extend(collected.directives);
            aggregation.matched.extend(collected.matched);
            aggregation.errors.extend(collected.errors);
        }

        tracing::debug!(
            fragment = %fragment.object_ref(),
            filters = aggregation.resources.filters.len(),
            outputs = aggregation.resources.outputs.len(),
            errors = aggregation.errors.len(),
            "Aggregated fragment resources"
        );
        Ok(aggregation)
    }

    fn collect(
        &self,
        fragment: &ConfigFragment,
        selectors: &FragmentSelectors,
        kind: PluginKind,
        scope: Scope,
    ) -> Result<Collected, CompileError> {
        let namespace = match scope {
            Scope::Cluster => None,
            Scope::Namespaced => fragment.namespace.as_deref(),
        };
        let mut resources = match self
            .store
            .list_plugins(kind, scope, selectors.for_kind(kind), namespace)
        {
            Ok(resources) => resources,
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        resources.sort_by_key(|r| r.object_ref());

        let cfg_id = fragment.cfg_id();
        let mut collected = Collected::default();
        for resource in resources {
            let owner = resource.object_ref();
            for (index, directive) in resource.directives.iter().enumerate() {
                let mut directive = directive.clone();
                if directive.id.is_none() {
                    directive.id = Some(format!(
                        "{}::{}::{}::{}-{}",
                        cfg_id,
                        scope.as_str(),
                        kind.as_str(),
                        resource.name,
                        index
                    ));
                }
                match resolve_secrets(&mut directive, self.secrets, self.secret_namespace) {
                    Ok(()) => collected.directives.push(directive),
                    Err(StoreError::NotFound(msg)) => {
                        collected.errors.push(format!("{}: {}", owner, msg));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            collected.matched.push(owner);
        }
        Ok(collected)
    }
}

/// Replace every secret reference in `directive` with the secret's value.
pub fn resolve_secrets(
    directive: &mut PluginDirective,
    secrets: &dyn SecretLoader,
    namespace: &str,
) -> Result<(), StoreError> {
    for value in directive.params.values_mut() {
        resolve_value(value, secrets, namespace)?;
    }
    Ok(())
}

fn resolve_value(value: &mut ParamValue, secrets: &dyn SecretLoader, namespace: &str) -> Result<(), StoreError> {
    match value {
        ParamValue::Secret(secret) => {
            let key_ref = &secret.value_from.secret_key_ref;
            let loaded = secrets.load(namespace, &key_ref.name, &key_ref.key)?;
            *value = ParamValue::Text(loaded);
        }
        ParamValue::Section(params) => {
            for nested in params.values_mut() {
                resolve_value(nested, secrets, namespace)?;
            }
        }
        ParamValue::List(items) => {
            for nested in items.iter_mut() {
                resolve_value(nested, secrets, namespace)?;
            }
        }
        _ => {}
    }
    Ok(())
}
