//! AWS integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_integration -- --ignored
//! ```

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
    VersioningConfiguration,
};
use cfn_purge::aws::{
    AwsContext, CloudFormationClient, EcrClient, FromAwsContext, IamClient, S3Client,
};
use cfn_purge::operation::bucket::BucketOperator;
use cfn_purge_test_utils::{get_test_region, test_bucket_name, test_run_id};
use std::sync::Arc;

async fn context() -> AwsContext {
    AwsContext::load(Some(&get_test_region()), None).await
}

/// Create a versioned bucket holding several versions and a delete marker
async fn create_versioned_bucket(ctx: &AwsContext, bucket: &str) {
    let s3 = ctx.s3_client();
    let region = get_test_region();

    let mut request = s3.create_bucket().bucket(bucket);
    if region != "us-east-1" {
        request = request.create_bucket_configuration(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region.as_str()))
                .build(),
        );
    }
    request
        .send()
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");

    s3.put_bucket_versioning()
        .bucket(bucket)
        .versioning_configuration(
            VersioningConfiguration::builder()
                .status(BucketVersioningStatus::Enabled)
                .build(),
        )
        .send()
        .await
        .expect("Should enable versioning");

    for round in 0..2 {
        for key in ["a.txt", "b.txt", "nested/c.txt"] {
            s3.put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(format!("{key} round {round}").into_bytes()))
                .send()
                .await
                .expect("Should upload object");
        }
    }

    s3.delete_object()
        .bucket(bucket)
        .key("a.txt")
        .send()
        .await
        .expect("Should create delete marker");
}

/// Missing resources count as already deleted
#[tokio::test]
#[ignore]
async fn test_missing_resources_report_absent() {
    let ctx = context().await;
    let name = format!("cfn-purge-missing-{}", test_run_id());

    assert!(!S3Client::from_context(&ctx).bucket_exists(&name).await.unwrap());
    assert!(!IamClient::from_context(&ctx).role_exists(&name).await.unwrap());
    assert!(!EcrClient::from_context(&ctx).repository_exists(&name).await.unwrap());
    assert!(
        CloudFormationClient::from_context(&ctx)
            .describe_stack(&name)
            .await
            .unwrap()
            .is_none()
    );
}

/// Deleting an already-deleted bucket succeeds
#[tokio::test]
#[ignore]
async fn test_bucket_delete_is_idempotent() {
    let ctx = context().await;
    let operator = BucketOperator::new(Arc::new(S3Client::from_context(&ctx)), 4, 10);

    operator
        .delete_bucket(&test_bucket_name())
        .await
        .expect("Missing bucket should count as deleted");
}

/// A versioned bucket with delete markers is emptied and removed
#[tokio::test]
#[ignore]
async fn test_versioned_bucket_force_deleted() {
    let ctx = context().await;
    let bucket = test_bucket_name();
    create_versioned_bucket(&ctx, &bucket).await;

    let s3 = Arc::new(S3Client::from_context(&ctx));
    let page = s3
        .list_object_versions(&bucket, None, None)
        .await
        .expect("Should list versions");
    assert_eq!(page.versions.len(), 7, "six versions plus one delete marker");

    BucketOperator::new(s3.clone(), 4, 10)
        .delete_bucket(&bucket)
        .await
        .expect("Should empty and delete bucket");

    assert!(!s3.bucket_exists(&bucket).await.unwrap());
}
