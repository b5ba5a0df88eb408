use bulk_source::QueryJob;

use crate::config::AppConfig;

const PRODUCTS: &str = r#"{
  products {
    edges {
      node {
        id
        handle
        title
        description
        productType
        vendor
        tags
        createdAt
        updatedAt
        featuredMedia {
          preview {
            image {
              id
              altText
              originalSrc
            }
          }
        }
      }
    }
  }
}"#;

const PRODUCT_VARIANTS: &str = r#"{
  productVariants {
    edges {
      node {
        id
        title
        sku
        price
        availableForSale
        inventoryQuantity
        product {
          id
        }
        image {
          id
          altText
          originalSrc
        }
      }
    }
  }
}"#;

const COLLECTIONS: &str = r#"{
  collections {
    edges {
      node {
        id
        handle
        title
        description
        updatedAt
        image {
          id
          altText
          originalSrc
        }
        products {
          edges {
            node {
              id
            }
          }
        }
      }
    }
  }
}"#;

const ORDERS: &str = r#"{
  orders {
    edges {
      node {
        id
        name
        createdAt
        displayFinancialStatus
        displayFulfillmentStatus
        totalPriceSet {
          shopMoney {
            amount
            currencyCode
          }
        }
        lineItems {
          edges {
            node {
              id
              title
              quantity
              sku
            }
          }
        }
      }
    }
  }
}"#;

/// Jobs shipped with the binary.
pub fn builtin_jobs() -> Vec<QueryJob> {
    vec![
        QueryJob::new("products", PRODUCTS),
        QueryJob::new("product-variants", PRODUCT_VARIANTS),
        QueryJob::new("collections", COLLECTIONS),
        QueryJob::new("orders", ORDERS),
    ]
}

/// Built-in jobs plus configured ones, configured jobs replacing built-ins
/// of the same name.
pub fn all_jobs(config: &AppConfig) -> Vec<QueryJob> {
    let mut jobs: Vec<QueryJob> = builtin_jobs()
        .into_iter()
        .filter(|job| !config.jobs.iter().any(|entry| entry.name == job_name(job)))
        .collect();

    jobs.extend(
        config
            .jobs
            .iter()
            .map(|entry| QueryJob::new(&entry.name, &entry.query)),
    );
    jobs
}

pub fn find_job(config: &AppConfig, name: &str) -> Option<QueryJob> {
    all_jobs(config).into_iter().find(|job| job_name(job) == name)
}

pub fn job_name(job: &QueryJob) -> &str {
    bulk_source::JobCreator::name(job)
}
