use portfolio_api::storage::{MockObjectStore, ObjectStore, S3ObjectStore, sanitize_key};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockObjectStore::new();
        let key = "photos/1700000000000_lake.jpg";
        let upload = mock.presign_upload(key, "image/jpeg").await.unwrap();

        assert!(upload.upload_url.contains("signature=fake"));
        assert!(upload.upload_url.contains(key));
        assert!(upload.public_url.ends_with(key));
        assert!(!upload.public_url.contains('?'));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockObjectStore::new_failing();
        let result = mock.presign_upload("test.mp3", "audio/mpeg").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockObjectStore::new();
        let upload = mock
            .presign_upload("../../etc/passwd", "text/plain")
            .await
            .unwrap();

        assert!(!upload.upload_url.contains(".."));
    }
}

#[cfg(test)]
mod key_tests {
    use super::*;

    #[test]
    fn test_sanitize_key_strips_traversal() {
        assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_key("photos/./2024//a.jpg"), "photos/2024/a.jpg");
        assert_eq!(sanitize_key("/.."), "");
        assert_eq!(sanitize_key("songs/track.mp3"), "songs/track.mp3");
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    fn client() -> S3ObjectStore {
        S3ObjectStore::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
            "http://localhost:9000/testbucket/",
        )
    }

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        let key = format!("uploads/report-{}.pdf", Uuid::new_v4());
        let upload = client()
            .presign_upload(&key, "application/pdf")
            .await
            .unwrap();

        // Presigning is local; nothing is sent to the endpoint.
        assert!(upload.upload_url.contains("localhost:9000"));
        assert!(upload.upload_url.contains(&key));
        assert!(upload.upload_url.contains("X-Amz-Signature"));
        assert_eq!(
            upload.public_url,
            format!("http://localhost:9000/testbucket/{}", key)
        );
    }
}
