use conduit::Notification;

#[derive(Notification)]
struct UserRegistered;

#[derive(Notification)]
#[notification(name = "order.shipped")]
struct OrderShipped {
    #[allow(dead_code)]
    id: u32,
}

fn main() {
    assert_eq!(<UserRegistered as Notification>::NAME, "UserRegistered");
    assert_eq!(<OrderShipped as Notification>::NAME, "order.shipped");
}
