//! Logical views the application can be pointed at.

use std::fmt;

use shared::domain::Role;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    RoleSelection,
    Wizard { role: Role },
    Employees { page: usize },
    NotFound { path: String },
}

impl Route {
    pub fn employees() -> Self {
        Route::Employees { page: 1 }
    }

    /// Resolves an in-app path such as `/wizard?role=ops`. Unknown roles fall back to admin,
    /// unknown paths land on [`Route::NotFound`].
    pub fn parse(path: &str) -> Self {
        let parsed = Url::parse("http://localhost/").and_then(|base| base.join(path.trim()));
        let Ok(url) = parsed else {
            return Route::NotFound {
                path: path.to_string(),
            };
        };

        let route_path = match url.path().trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        let query = |key: &str| {
            url.query_pairs()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.into_owned())
        };

        match route_path {
            "/" => Route::RoleSelection,
            "/wizard" => Route::Wizard {
                role: query("role")
                    .and_then(|role| role.parse().ok())
                    .unwrap_or_default(),
            },
            "/employees" => Route::Employees {
                page: query("page")
                    .and_then(|page| page.parse::<usize>().ok())
                    .filter(|page| *page >= 1)
                    .unwrap_or(1),
            },
            _ => Route::NotFound {
                path: path.to_string(),
            },
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::RoleSelection => "/".to_string(),
            Route::Wizard { role } => format!("/wizard?role={role}"),
            Route::Employees { page: 1 } => "/employees".to_string(),
            Route::Employees { page } => format!("/employees?page={page}"),
            Route::NotFound { path } => path.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_paths() {
        assert_eq!(Route::parse("/"), Route::RoleSelection);
        assert_eq!(Route::parse("/employees"), Route::employees());
        assert_eq!(
            Route::parse("/employees/?page=3"),
            Route::Employees { page: 3 }
        );
        assert_eq!(
            Route::parse("/wizard?role=ops"),
            Route::Wizard { role: Role::Ops }
        );
    }

    #[test]
    fn wizard_role_defaults_to_admin() {
        assert_eq!(
            Route::parse("/wizard"),
            Route::Wizard { role: Role::Admin }
        );
        assert_eq!(
            Route::parse("/wizard?role=owner"),
            Route::Wizard { role: Role::Admin }
        );
    }

    #[test]
    fn invalid_page_falls_back_to_first() {
        assert_eq!(Route::parse("/employees?page=0"), Route::employees());
        assert_eq!(Route::parse("/employees?page=abc"), Route::employees());
    }

    #[test]
    fn unmatched_paths_are_not_found() {
        assert_eq!(
            Route::parse("/settings/profile"),
            Route::NotFound {
                path: "/settings/profile".to_string()
            }
        );
    }

    #[test]
    fn paths_round_trip() {
        for route in [
            Route::RoleSelection,
            Route::Wizard { role: Role::Ops },
            Route::employees(),
            Route::Employees { page: 4 },
        ] {
            assert_eq!(Route::parse(&route.to_path()), route);
        }
    }
}
