//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 specification for the medverify API.

use utoipa::OpenApi;

use crate::handlers::{HealthResponse, ReadyResponse};

/// Medverify API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Medverify API",
        version = "0.1.0",
        description = r#"
## Pharmaceutical Product Verification API

Medverify verifies packaged pharmaceutical products from a photo:

1. **Extract** - the packaging photo is stored and scanned for a regulatory
   registration number; when none is readable, a vision model supplies a
   best-effort product name
2. **Match** - the number (or name) is searched in the public product
   registry through a scripted browser session
3. **Record** - the structured verdict is durably recorded with a 90-day
   retention horizon

### Endpoints

- `POST /verify` runs the full pipeline
- `POST /process-image` and `POST /validate` expose the two stages
  individually for clients that stage their own flow
"#,
        license(
            name = "MIT OR Apache-2.0",
            url = "https://github.com/medverify/medverify/blob/main/LICENSE"
        ),
        contact(
            name = "Medverify Team",
            url = "https://github.com/medverify/medverify"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Verification", description = "Photo verification pipeline and its stages"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::verify::verify_handler,
        crate::handlers::process_image::process_image_handler,
        crate::handlers::validate::validate_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
        )
    )
)]
pub struct ApiDoc;
