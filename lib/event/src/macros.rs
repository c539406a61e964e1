#[macro_export]
macro_rules! tags {
    ( $($x:expr => $y:expr),* ) => ({
        let mut _map: std::collections::BTreeMap<String, String> = std::collections::BTreeMap::new();
        $(
            _map.insert($x.into(), $y.into());
        )*
        _map
    });
    ( $($x:expr => $y:expr,)* ) => (
        $crate::tags!{$($x => $y),*}
    );
}

#[cfg(test)]
mod tests {
    #[test]
    fn trailing_comma() {
        let tags = tags!(
            "chassis" => "/redfish/v1/Chassis/1",
            "member_id" => String::from("0"),
        );

        assert_eq!(tags.len(), 2);
        assert_eq!(tags["member_id"], "0");
    }
}
