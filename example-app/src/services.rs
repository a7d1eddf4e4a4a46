//! 系统服务
//!
//! 振动器这类设备不由应用创建，而是向宿主的服务目录按名称取用。

use di_abstractions::ExternalServiceProvider;
use infrastructure_common::{AnyInstance, Qualifier, RequestKey};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// 振动器服务名
pub const VIBRATOR_SERVICE: &str = "vibrator";

/// 振动器
#[derive(Debug)]
pub struct Vibrator {
    device: String,
    total_millis: AtomicU64,
}

impl Vibrator {
    /// 打开设备
    pub fn open(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            total_millis: AtomicU64::new(0),
        }
    }

    /// 振动指定毫秒数
    pub fn vibrate(&self, millis: u64) {
        self.total_millis.fetch_add(millis, Ordering::Relaxed);
        info!(device = %self.device, millis, "振动");
    }

    /// 累计振动时长
    pub fn total_millis(&self) -> u64 {
        self.total_millis.load(Ordering::Relaxed)
    }
}

/// 宿主的系统服务目录
pub struct SystemServices {
    services: HashMap<&'static str, AnyInstance>,
    by_type: HashMap<TypeId, &'static str>,
}

impl SystemServices {
    /// 打开默认设备
    pub fn open() -> Self {
        let mut services: HashMap<&'static str, AnyInstance> = HashMap::new();
        services.insert(VIBRATOR_SERVICE, Arc::new(Vibrator::open("vibrator-0")));

        let mut by_type = HashMap::new();
        by_type.insert(TypeId::of::<Vibrator>(), VIBRATOR_SERVICE);

        Self { services, by_type }
    }
}

impl ExternalServiceProvider for SystemServices {
    fn name(&self) -> &str {
        "system-services"
    }

    fn recognizes(&self, key: &RequestKey) -> Option<String> {
        match key.qualifier() {
            Some(Qualifier::Name(name)) => self
                .services
                .contains_key(name.as_str())
                .then(|| name.clone()),
            Some(Qualifier::Id(_)) => None,
            None => self.by_type.get(&key.type_id()).map(|name| (*name).to_string()),
        }
    }

    fn fetch(&self, service: &str, _key: &RequestKey) -> Option<AnyInstance> {
        self.services.get(service).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vibrator_recognized_by_type_and_name() {
        let services = SystemServices::open();

        assert_eq!(
            services.recognizes(&RequestKey::of::<Vibrator>()).as_deref(),
            Some(VIBRATOR_SERVICE)
        );
        assert_eq!(
            services
                .recognizes(&RequestKey::named::<Vibrator>(VIBRATOR_SERVICE))
                .as_deref(),
            Some(VIBRATOR_SERVICE)
        );
        assert!(services.recognizes(&RequestKey::of::<String>()).is_none());
        assert!(services
            .recognizes(&RequestKey::named::<Vibrator>("camera"))
            .is_none());

        let vibrator = services
            .fetch(VIBRATOR_SERVICE, &RequestKey::of::<Vibrator>())
            .unwrap()
            .downcast::<Vibrator>()
            .unwrap();
        vibrator.vibrate(40);
        assert_eq!(vibrator.total_millis(), 40);
    }
}
