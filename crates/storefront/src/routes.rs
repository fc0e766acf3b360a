//! Route table.
//!
//! Maps paths to views and declares what each view requires. Public views
//! render for everyone; gated views go through [`crate::gate::authorize`].

use artisan_core::{ProductId, Role};

/// Where users land when they must sign in.
pub const LOGIN_PATH: &str = "/login";
/// Where users land when their role is insufficient.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
/// Landing page after a seller logs in.
pub const SELLER_LANDING: &str = "/seller/dashboard";
/// Landing page after anyone else logs in.
pub const DEFAULT_LANDING: &str = "/";

/// A view of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Products,
    Product(ProductId),
    About,
    Contact,
    Cart,
    Login,
    Register,
    BuyerProfile,
    Checkout,
    SellerDashboard,
    SellerProfile,
    SellerAddItem,
    SellerMyProducts,
    SellerEditItem(ProductId),
    Unauthorized,
    NotFound,
}

/// Access requirement of a gated route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequirement {
    /// Route pattern, e.g. `/seller/edit-item/:id`.
    pub path: &'static str,
    /// Role the signed-in user must hold, if any.
    pub required_role: Option<Role>,
}

impl RouteRequirement {
    /// Any signed-in user.
    #[must_use]
    pub const fn authenticated(path: &'static str) -> Self {
        Self {
            path,
            required_role: None,
        }
    }

    /// Signed-in users holding `role`.
    #[must_use]
    pub const fn role(path: &'static str, role: Role) -> Self {
        Self {
            path,
            required_role: Some(role),
        }
    }
}

impl Route {
    /// Match a path against the route table.
    ///
    /// Query strings, fragments and a trailing slash are ignored. Matching
    /// is case sensitive, so `/Profile` and `/profile` differ.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["product"] => Self::Products,
            ["product", id] if !id.is_empty() => Self::Product(ProductId::new(*id)),
            ["about"] => Self::About,
            ["contact"] => Self::Contact,
            ["cart"] => Self::Cart,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["Profile"] => Self::BuyerProfile,
            ["checkout"] => Self::Checkout,
            ["seller", "dashboard"] => Self::SellerDashboard,
            ["seller", "profile"] => Self::SellerProfile,
            ["seller", "add-item"] => Self::SellerAddItem,
            ["seller", "my-products"] => Self::SellerMyProducts,
            ["seller", "edit-item", id] if !id.is_empty() => {
                Self::SellerEditItem(ProductId::new(*id))
            }
            ["unauthorized"] => Self::Unauthorized,
            _ => Self::NotFound,
        }
    }

    /// The requirement guarding this route, or `None` for public routes.
    #[must_use]
    pub const fn requirement(&self) -> Option<RouteRequirement> {
        match self {
            Self::Checkout => Some(RouteRequirement::authenticated("/checkout")),
            Self::SellerDashboard => Some(RouteRequirement::role("/seller/dashboard", Role::Seller)),
            Self::SellerProfile => Some(RouteRequirement::role("/seller/profile", Role::Seller)),
            Self::SellerAddItem => Some(RouteRequirement::role("/seller/add-item", Role::Seller)),
            Self::SellerMyProducts => {
                Some(RouteRequirement::role("/seller/my-products", Role::Seller))
            }
            Self::SellerEditItem(_) => {
                Some(RouteRequirement::role("/seller/edit-item/:id", Role::Seller))
            }
            _ => None,
        }
    }

    /// Canonical path of this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Products => "/product".to_string(),
            Self::Product(id) => format!("/product/{id}"),
            Self::About => "/about".to_string(),
            Self::Contact => "/contact".to_string(),
            Self::Cart => "/cart".to_string(),
            Self::Login => LOGIN_PATH.to_string(),
            Self::Register => "/register".to_string(),
            Self::BuyerProfile => "/Profile".to_string(),
            Self::Checkout => "/checkout".to_string(),
            Self::SellerDashboard => SELLER_LANDING.to_string(),
            Self::SellerProfile => "/seller/profile".to_string(),
            Self::SellerAddItem => "/seller/add-item".to_string(),
            Self::SellerMyProducts => "/seller/my-products".to_string(),
            Self::SellerEditItem(id) => format!("/seller/edit-item/{id}"),
            Self::Unauthorized => UNAUTHORIZED_PATH.to_string(),
            Self::NotFound => "/404".to_string(),
        }
    }

    /// Page title shown in the terminal front-end.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Products => "Products",
            Self::Product(_) => "Product",
            Self::About => "About",
            Self::Contact => "Contact",
            Self::Cart => "Cart",
            Self::Login => "Login",
            Self::Register => "Register",
            Self::BuyerProfile => "Profile",
            Self::Checkout => "Checkout",
            Self::SellerDashboard => "Seller Dashboard",
            Self::SellerProfile => "Seller Profile",
            Self::SellerAddItem => "Add Item",
            Self::SellerMyProducts => "My Products",
            Self::SellerEditItem(_) => "Edit Item",
            Self::Unauthorized => "Unauthorized Access",
            Self::NotFound => "Page Not Found",
        }
    }
}

/// Path a user lands on after logging in with `role`.
#[must_use]
pub const fn landing_for(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Seller) => SELLER_LANDING,
        _ => DEFAULT_LANDING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_public_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/product"), Route::Products);
        assert_eq!(Route::parse("/product/"), Route::Products);
        assert_eq!(
            Route::parse("/product/abc?ref=home"),
            Route::Product(ProductId::new("abc"))
        );
        assert_eq!(Route::parse("/Profile"), Route::BuyerProfile);
        assert_eq!(Route::parse("/profile"), Route::NotFound);
    }

    #[test]
    fn test_parse_seller_routes() {
        assert_eq!(Route::parse("/seller/dashboard"), Route::SellerDashboard);
        assert_eq!(
            Route::parse("/seller/edit-item/p9"),
            Route::SellerEditItem(ProductId::new("p9"))
        );
        assert_eq!(Route::parse("/seller/unknown"), Route::NotFound);
        assert_eq!(Route::parse("/seller/edit-item"), Route::NotFound);
    }

    #[test]
    fn test_requirements() {
        assert_eq!(Route::Home.requirement(), None);
        assert_eq!(Route::Cart.requirement(), None);
        assert_eq!(Route::Unauthorized.requirement(), None);
        assert_eq!(
            Route::Checkout.requirement(),
            Some(RouteRequirement::authenticated("/checkout"))
        );
        assert_eq!(
            Route::SellerMyProducts
                .requirement()
                .and_then(|r| r.required_role),
            Some(Role::Seller)
        );
    }

    #[test]
    fn test_paths_parse_back() {
        let routes = [
            Route::Home,
            Route::Product(ProductId::new("p1")),
            Route::BuyerProfile,
            Route::Checkout,
            Route::SellerEditItem(ProductId::new("p2")),
            Route::Unauthorized,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn test_landing_for_role() {
        assert_eq!(landing_for(Some(Role::Seller)), SELLER_LANDING);
        assert_eq!(landing_for(Some(Role::User)), DEFAULT_LANDING);
        assert_eq!(landing_for(None), DEFAULT_LANDING);
    }
}
