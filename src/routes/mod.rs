/// Router Module Index
///
/// Organizes routing into the two applications this process serves, keeping
/// the access model explicit at the module level: everything in `site` is
/// anonymous, everything in `admin` sits behind the admission middleware.

/// The public storefront and marketing surface. No authentication; data
/// handlers must enforce published-only visibility at the repository level.
pub mod site;

/// The admin console. The whole router is wrapped by the admission
/// middleware; mutating handlers additionally re-verify authorization
/// in place.
pub mod admin;
