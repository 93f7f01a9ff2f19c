//! Profile and collection metadata tests against real backends.

mod common;

use common::*;
use folio_core::{CollectionMetadata, CollectionType};
use folio_store::{ProfileUpdate, StoreError};

fn metadata(heading: &str) -> CollectionMetadata {
    CollectionMetadata {
        heading: heading.to_string(),
        description: "Shown above the section".to_string(),
    }
}

#[tokio::test]
async fn test_metadata_missing_profile_is_not_found() {
    run_store_test_both(|store| async move {
        let service = service(store);
        let alice = owner("alice");

        let err = service
            .get_metadata(&alice, CollectionType::Education)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = service
            .set_metadata(&alice, CollectionType::Education, &metadata("Education"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    })
    .await;
}

#[tokio::test]
async fn test_metadata_round_trip_per_collection() {
    run_store_test_both(|store| async move {
        let service = service(store);
        let alice = owner("alice");
        create_profile(&service, &alice).await;

        assert_eq!(
            service
                .get_metadata(&alice, CollectionType::Certification)
                .await
                .unwrap(),
            None
        );

        service
            .set_metadata(&alice, CollectionType::Certification, &metadata("Certificates"))
            .await
            .unwrap();
        service
            .set_metadata(&alice, CollectionType::WorkGallery, &metadata("Gallery"))
            .await
            .unwrap();
        service
            .set_metadata(&alice, CollectionType::Certification, &metadata("Courses"))
            .await
            .unwrap();

        assert_eq!(
            service
                .get_metadata(&alice, CollectionType::Certification)
                .await
                .unwrap(),
            Some(metadata("Courses"))
        );
        assert_eq!(
            service
                .get_metadata(&alice, CollectionType::WorkGallery)
                .await
                .unwrap(),
            Some(metadata("Gallery"))
        );

        let profile = service.get_profile(&alice).await.unwrap();
        assert!(profile.attributes.get("certification_metadata").is_some());
        assert!(profile.attributes.get("work_gallery_metadata").is_some());
    })
    .await;
}

#[tokio::test]
async fn test_profile_upsert_keeps_attributes() {
    run_store_test_both(|store| async move {
        let service = service(store);
        let alice = owner("alice");
        create_profile(&service, &alice).await;
        service
            .set_metadata(&alice, CollectionType::Hackathon, &metadata("Hackathons"))
            .await
            .unwrap();

        let profile = service
            .upsert_profile(
                &alice,
                &ProfileUpdate {
                    email: "alice@new.example.com".to_string(),
                    full_name: Some("Alice Liddell".to_string()),
                    avatar_url: Some("https://cdn.example.com/alice.png".to_string()),
                    slug: Some("alice-liddell".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.email, "alice@new.example.com");
        assert_eq!(profile.slug.as_deref(), Some("alice-liddell"));
        assert_eq!(
            profile.attributes["hackathon_metadata"]["heading"],
            "Hackathons"
        );
    })
    .await;
}

#[tokio::test]
async fn test_get_profile_missing() {
    let test = TestStore::in_memory().await.unwrap();
    let service = service(test.store());
    let err = service.get_profile(&owner("nobody")).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_public_listing_by_slug() {
    run_store_test_both(|store| async move {
        let service = service(store);
        let alice = owner("alice");
        create_profile(&service, &alice).await;
        for title in ["Alpha", "Bravo"] {
            service.create(&alice, &hackathon(title)).await.unwrap();
        }
        service
            .create(&alice, &gallery_project("Site", &["https://cdn.example.com/a.png"]))
            .await
            .unwrap();

        let public = service
            .list_public("alice", CollectionType::Hackathon)
            .await
            .unwrap();
        assert_eq!(
            public,
            service.list(&alice, CollectionType::Hackathon).await.unwrap()
        );
        assert_eq!(public[0].item.position, 2);

        let gallery = service
            .list_public("alice", CollectionType::WorkGallery)
            .await
            .unwrap();
        assert_eq!(gallery[0].attachments.as_ref().unwrap().len(), 1);

        let err = service
            .list_public("nobody", CollectionType::Hackathon)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    })
    .await;
}

#[tokio::test]
async fn test_slug_taken_by_another_profile() {
    run_store_test_both(|store| async move {
        let service = service(store);
        let alice = owner("alice");
        let bob = owner("bob");
        create_profile(&service, &alice).await;

        let err = service
            .upsert_profile(
                &bob,
                &ProfileUpdate {
                    email: "bob@example.com".to_string(),
                    full_name: None,
                    avatar_url: None,
                    slug: Some("alice".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert!(matches!(
            service.get_profile(&bob).await.unwrap_err(),
            StoreError::NotFound(_)
        ));

        // Profiles without a slug do not collide.
        for user in [&bob, &owner("carol")] {
            service
                .upsert_profile(
                    user,
                    &ProfileUpdate {
                        email: format!("{user}@example.com"),
                        full_name: None,
                        avatar_url: None,
                        slug: None,
                    },
                )
                .await
                .unwrap();
        }
    })
    .await;
}
