pub mod aws;
pub mod generator;
pub mod identity;
pub mod issuer;
pub mod resolver;
pub mod sts;

pub use aws::AwsSdkLoader;
pub use generator::TemporaryCredentialsGenerator;
pub use identity::IdentityClient;
pub use issuer::{ClusterCredentialsIssuer, ClusterCredentialsRequest, RedshiftCredentialsIssuer};
pub use resolver::CredentialResolver;
pub use sts::StsIdentityClient;
