/// A campus service people can line up for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Service {
    pub id: &'static str,
    pub name: &'static str,
}

pub const SERVICES: [Service; 3] = [
    Service {
        id: "clinic",
        name: "Clinic",
    },
    Service {
        id: "bursary",
        name: "Bursary",
    },
    Service {
        id: "cafeteria",
        name: "Cafeteria",
    },
];
