use imaginai::preview::{PreviewRegistry, PreviewSlot};

#[test]
fn test_acquire_and_release() {
    let registry = PreviewRegistry::new();
    let handle = registry.acquire(vec![1u8, 2, 3], "image/png");

    let url = handle.url();
    assert!(url.starts_with("blob:imaginai/"));
    let entry = registry.resolve(&url).unwrap();
    assert_eq!(entry.mime_type, "image/png");
    assert_eq!(&*entry.bytes, &[1, 2, 3]);
    assert_eq!(registry.live_handles(), 1);

    handle.release();
    assert_eq!(registry.live_handles(), 0);
    assert!(registry.resolve(&url).is_none());
}

#[test]
fn test_slot_releases_previous_before_replacing() {
    let registry = PreviewRegistry::new();
    let mut slot = PreviewSlot::new(registry.clone());

    let first = slot.replace(vec![1u8], "image/png");
    let second = slot.replace(vec![2u8], "image/gif");

    assert_ne!(first, second);
    assert_eq!(registry.live_handles(), 1);
    assert!(registry.resolve(&first).is_none());
    assert_eq!(slot.current_url().as_deref(), Some(second.as_str()));

    slot.clear();
    assert_eq!(registry.live_handles(), 0);
    assert!(slot.current_url().is_none());
}

#[test]
fn test_handles_release_on_early_exit() {
    fn fails_midway(registry: &PreviewRegistry) -> Result<u32, String> {
        let _handle = registry.acquire(vec![0u8; 16], "image/webp");
        let width = "wide".parse::<u32>().map_err(|e| e.to_string())?;
        Ok(width)
    }

    let registry = PreviewRegistry::new();
    assert!(fails_midway(&registry).is_err());
    assert_eq!(registry.live_handles(), 0);
}

#[test]
fn test_slot_teardown_releases() {
    let registry = PreviewRegistry::new();
    {
        let mut slot = PreviewSlot::new(registry.clone());
        slot.replace(vec![9u8; 4], "image/jpeg");
        assert_eq!(registry.live_handles(), 1);
    }
    assert_eq!(registry.live_handles(), 0);
}

#[test]
fn test_resolve_rejects_foreign_urls() {
    let registry = PreviewRegistry::new();
    let _handle = registry.acquire(vec![1u8], "image/png");

    assert!(registry.resolve("https://example.com/x.png").is_none());
    assert!(registry.resolve("blob:imaginai/not-a-uuid").is_none());
}
