use crate::domain::RequestClass;

/// How a routed request is satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Always hit the network; on failure substitute the offline page.
    /// Never writes to cache.
    NetworkWithOfflineFallback,
    /// Network, then cache, then the offline page.
    NetworkFirst,
    /// Forward untouched. No lookup, no write, errors propagate.
    Bypass,
    /// Cache, then network with a write-through on success.
    CacheFirst,
}

/// One routing rule: requests of `class` are satisfied by `strategy`.
#[derive(Clone, Copy, Debug)]
pub struct Route {
    pub class: RequestClass,
    pub strategy: Strategy,
}

/// The routing policy as an ordered table, first match wins. Keeping the
/// tie-break order a data structure makes it inspectable and testable instead
/// of being implicit control flow.
#[derive(Clone, Debug)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The standard policy: mutating requests get the offline safety net,
    /// navigations are network-first, plain text is excluded from caching,
    /// everything else same-origin is cache-first.
    pub fn standard() -> Self {
        Self::new(vec![
            Route {
                class: RequestClass::NonIdempotent,
                strategy: Strategy::NetworkWithOfflineFallback,
            },
            Route {
                class: RequestClass::Navigation,
                strategy: Strategy::NetworkFirst,
            },
            Route {
                class: RequestClass::PlainText,
                strategy: Strategy::Bypass,
            },
            Route {
                class: RequestClass::Resource,
                strategy: Strategy::CacheFirst,
            },
        ])
    }

    pub fn strategy_for(&self, class: RequestClass) -> Option<Strategy> {
        self.routes
            .iter()
            .find(|route| route.class == class)
            .map(|route| route.strategy)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_orders_non_idempotent_before_navigation() {
        let table = RoutingTable::standard();
        let classes: Vec<RequestClass> = table.routes().iter().map(|r| r.class).collect();
        assert_eq!(
            classes,
            vec![
                RequestClass::NonIdempotent,
                RequestClass::Navigation,
                RequestClass::PlainText,
                RequestClass::Resource,
            ]
        );
    }

    #[test]
    fn standard_table_maps_each_class_to_its_strategy() {
        let table = RoutingTable::standard();
        assert_eq!(
            table.strategy_for(RequestClass::NonIdempotent),
            Some(Strategy::NetworkWithOfflineFallback)
        );
        assert_eq!(
            table.strategy_for(RequestClass::Navigation),
            Some(Strategy::NetworkFirst)
        );
        assert_eq!(
            table.strategy_for(RequestClass::PlainText),
            Some(Strategy::Bypass)
        );
        assert_eq!(
            table.strategy_for(RequestClass::Resource),
            Some(Strategy::CacheFirst)
        );
    }

    #[test]
    fn external_requests_match_no_route() {
        let table = RoutingTable::standard();
        assert_eq!(table.strategy_for(RequestClass::External), None);
    }
}
