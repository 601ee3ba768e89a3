//! Event macros that stamp each line with the emitting component
//! (`registrar`, `record`, `sandbox`, `service`).

/// `log_event!(warn, "sandbox", "bounce", %address)`
#[macro_export]
macro_rules! log_event {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)+)?) => {
        ::tracing::$level!(component = $component, $($($field)+,)? $msg)
    };
}

/// Like [`log_event!`], plus the domain name and its record address.
#[macro_export]
macro_rules! log_domain_event {
    ($level:ident, $component:expr, $msg:expr, $domain:expr, $record:expr $(, $($field:tt)+)?) => {
        $crate::log_event!(
            $level,
            $component,
            $msg,
            domain = %$domain,
            record = %$record
            $(, $($field)+)?
        )
    };
}

/// Bumps a counter, optionally selecting a label set first.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
