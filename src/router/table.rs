use std::sync::Arc;

use crate::error::{Error, Result};
use crate::request::Request;
use crate::url::Url;

use super::config::{RouteConfig, RouteFile};
use super::route::Route;
use super::target::{Namespace, Target, TargetRef};

/// The routes of an application, in priority order, plus an optional error
/// route.
///
/// Build it once at startup and hand it to a [`Router`](super::Router).
/// Registration order is match order: register specific routes before the
/// general ones that would shadow them.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    error: Option<Target>,
    namespace: Namespace,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves string targets against `namespace`.
    pub fn with_namespace(namespace: Namespace) -> Self {
        Self { namespace, ..Self::default() }
    }

    /// Builds a table from a TOML route file, see [`config`](super::config).
    pub fn from_toml(source: &str, namespace: Namespace) -> Result<Self> {
        let mut table = Self::with_namespace(namespace);
        table.load_toml(source)?;
        Ok(table)
    }

    /// Registers the routes of a TOML route file after the existing ones.
    pub fn load_toml(&mut self, source: &str) -> Result<()> {
        let file: RouteFile = toml::from_str(source)?;
        for entry in file.routes {
            self.map(entry.name, entry.config)?;
        }
        if let Some(error) = file.error {
            self.set_error(error)?;
        }
        Ok(())
    }

    /// Registers a route.
    ///
    /// Fails when the name is taken, when the target cannot be resolved, or
    /// when the path does not compile.
    pub fn map(&mut self, name: impl Into<String>, config: RouteConfig) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(Error::DuplicateRoute(name));
        }
        let target = self.namespace.resolve_ref(config.target.clone())?;
        self.routes.push(Arc::new(Route::new(name, config, target)?));
        Ok(())
    }

    /// Registers several routes in iteration order. Stops at the first failure.
    pub fn map_all<I, N>(&mut self, routes: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, RouteConfig)>,
        N: Into<String>,
    {
        routes.into_iter().try_for_each(|(name, config)| self.map(name, config))
    }

    /// Sets the target rendered when dispatch fails with an
    /// [`HttpError`](crate::HttpError).
    pub fn set_error(&mut self, target: impl Into<TargetRef>) -> Result<()> {
        self.error = Some(self.namespace.resolve_ref(target.into())?);
        Ok(())
    }

    pub fn error_target(&self) -> Option<&Target> {
        self.error.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.iter().find(|r| r.name() == name)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The first route, in registration order, that matches `req` under `base`.
    pub fn lookup(&self, req: &mut Request, base: &Url) -> Option<Arc<Route>> {
        self.routes.iter().find(|route| route.matches(req, base)).cloned()
    }

    /// The URL of the route called `name` under `base`.
    pub fn get_url(&self, name: &str, base: &Url, params: &[(&str, &str)]) -> Result<String> {
        self.get(name)
            .ok_or_else(|| Error::UnknownRoute(name.to_owned()))?
            .generate(base, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &'static str) -> Target {
        Target::function(move |_, _, _| Ok(text))
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut table = RouteTable::new();
        table.map("index", RouteConfig::new("/", reply("a"))).unwrap();
        let err = table.map("index", RouteConfig::new("/other", reply("b"))).unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute(name) if name == "index"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn first_registered_match_wins() {
        let mut table = RouteTable::new();
        table
            .map_all([
                ("numeric", RouteConfig::new("/put/{id}", reply("a")).filter("id", "[0-9]+")),
                ("any", RouteConfig::new("/put/{id}", reply("b"))),
            ])
            .unwrap();

        let base = Url::default();
        let mut req = Request::get("/put/23").unwrap();
        assert_eq!(table.lookup(&mut req, &base).unwrap().name(), "numeric");

        let mut req = Request::get("/put/2.3").unwrap();
        assert_eq!(table.lookup(&mut req, &base).unwrap().name(), "any");

        let mut req = Request::get("/get/23").unwrap();
        assert!(table.lookup(&mut req, &base).is_none());
    }

    #[test]
    fn unknown_route_names_fail_loudly() {
        let table = RouteTable::new();
        let err = table.get_url("missing", &Url::default(), &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownRoute(name) if name == "missing"));
    }

    #[test]
    fn string_targets_need_a_namespace_entry() {
        let mut table = RouteTable::new();
        let err = table.map("home", RouteConfig::new("/", "Home::index")).unwrap_err();
        assert!(matches!(err, Error::UnknownTarget(_)));

        let mut table = RouteTable::with_namespace(Namespace::new().with("Home::index", reply("home")));
        assert!(table.map("home", RouteConfig::new("/", "Home::index")).is_ok());
    }
}
