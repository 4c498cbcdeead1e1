/// Assert that a client's area of interest has reached a status
#[macro_export]
macro_rules! assert_area_status {
    ($client:expr, $address:expr, $status:expr) => {
        assert_eq!(
            $client.status(&$address),
            Some($status),
            "Area of interest {} is not {}",
            $address,
            $status
        );
    };
}

/// Assert that a server session holds a subscription entry for an address
#[macro_export]
macro_rules! assert_subscribed {
    ($server:expr, $key:expr, $address:expr) => {
        assert!(
            $server
                .manager()
                .session($key)
                .map(|session| session.is_subscribed(&$address))
                .unwrap_or(false),
            "Session {} is not subscribed to {}",
            $key,
            $address
        );
    };
}

/// Assert that a server session holds no subscription entry for an address
#[macro_export]
macro_rules! assert_not_subscribed {
    ($server:expr, $key:expr, $address:expr) => {
        assert!(
            !$server
                .manager()
                .session($key)
                .map(|session| session.is_subscribed(&$address))
                .unwrap_or(false),
            "Session {} is still subscribed to {}",
            $key,
            $address
        );
    };
}
