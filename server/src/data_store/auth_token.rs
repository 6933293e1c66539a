use crate::cli::CliAuthTokenKey;
use crate::data_store::{EventId, StoreError, UserId};

/// Authorization token for authorizing access to the data_store for a specific event
///
/// The AuthToken is keyed to a specific event (by its event id) and holds a list of active
/// [AccessRole]s of the current user for this event. These imply specific [Privilege]s.
///
/// This structure is our main protection against accidental unauthorized-access bugs: All
/// event-specific data_store access functions require an AuthToken and check the validity of the
/// AuthToken for the required event id and privilege. An AuthToken can only be created by
/// [crate::data_store::GuestPlanStoreFacade::get_auth_token_for_session], based on the user's
/// profile and event ownership/membership, and by cli functions via [Self::create_for_cli].
///
/// For global, not event-specific authorization, a [GlobalAuthToken] is required instead.
#[derive(Debug, Clone)]
pub struct AuthToken {
    event_id: EventId,
    user_id: Option<UserId>,
    roles: Vec<AccessRole>,
}

impl AuthToken {
    /// Create a new AuthToken for a logged-in user.
    ///
    /// This function must only be used by implementations of
    /// [crate::data_store::GuestPlanStoreFacade::get_auth_token_for_session] after determining the
    /// user's roles from the database!
    pub(super) fn create_for_session(
        event_id: EventId,
        user_id: UserId,
        roles: Vec<AccessRole>,
    ) -> Self {
        AuthToken {
            event_id,
            user_id: Some(user_id),
            roles,
        }
    }

    /// Create a new AuthToken for a command line interface functionality.
    ///
    /// The AuthToken is created with the AccessRole::Admin.
    ///
    /// This function must only be used by command line interface functions, not in the context of
    /// the web server!
    pub fn create_for_cli(event_id: EventId, _key: &CliAuthTokenKey) -> Self {
        AuthToken {
            event_id,
            user_id: None,
            roles: vec![AccessRole::Admin],
        }
    }

    /// Check if the AuthToken authorizes for the given `privilege`.
    ///
    /// The actual authorization check is delegated to [Privilege::qualifying_roles], by checking if
    /// any of the qualifying roles is active in the context (i.e. contained in the AuthToken)
    pub fn has_privilege(&self, event_id: EventId, privilege: Privilege) -> bool {
        event_id == self.event_id
            && privilege
                .qualifying_roles()
                .iter()
                .any(|role| self.roles.contains(role))
    }

    /// Check if the AuthToken authorizes for the given `privilege`. If not, return an appropriate
    /// PermissionDenied error.
    pub fn check_privilege(
        &self,
        event_id: EventId,
        privilege: Privilege,
    ) -> Result<(), StoreError> {
        if self.has_privilege(event_id, privilege) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
                event_id: Some(event_id),
            })
        }
    }

    /// The user this token has been created for, or None for command line interface tokens
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn roles(&self) -> &[AccessRole] {
        &self.roles
    }
}

/// Authorization token for authorizing access to the data_store for global (not event-specific)
/// actions, like listing all events or creating new client events.
///
/// An GlobalAuthToken can only be created by
/// [crate::data_store::GuestPlanStoreFacade::get_global_auth_token_for_session] and by cli
/// functions via [Self::create_for_cli].
#[derive(Debug, Clone)]
pub struct GlobalAuthToken {
    roles: Vec<AccessRole>,
}

impl GlobalAuthToken {
    pub(super) fn create_for_session(roles: Vec<AccessRole>) -> Self {
        GlobalAuthToken { roles }
    }

    pub fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        GlobalAuthToken {
            roles: vec![AccessRole::Admin],
        }
    }

    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        privilege
            .qualifying_roles()
            .iter()
            .any(|role| self.roles.contains(role))
    }

    pub fn check_privilege(&self, privilege: Privilege) -> Result<(), StoreError> {
        if self.has_privilege(privilege) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
                event_id: None,
            })
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&AccessRole::Admin)
    }
}

/// Possible roles of a user.
///
/// Each role qualifies for a set of [Privilege]s. See [Privilege::qualifying_roles].
/// `Owner` and `Member` are event-specific: the owner is the client who the event has been created
/// for, members are listed in the `event_members` table. `Admin` is derived from the user's
/// profile and is valid for all events.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy)]
pub enum AccessRole {
    Member,
    Owner,
    Admin,
}

impl AccessRole {
    pub fn name(&self) -> &str {
        match self {
            AccessRole::Member => "Member",
            AccessRole::Owner => "Event owner",
            AccessRole::Admin => "Administrator",
        }
    }
}

/// Enum of available authorization privileges.
///
/// Each data_store action and web endpoint typically requires a single privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    ShowGuestList,
    EditGuestList,
    SubmitGuestList,
    ExportGuestList,
    ManageEventStatus,
    ListAllEvents,
    CreateEvents,
}

impl Privilege {
    /// Get the list of user [AccessRole]s that qualify for this privilege. Each returned role is
    /// individually sufficient for the privilege.
    ///
    /// This is function is our source of truth for authorization!
    pub fn qualifying_roles(&self) -> &'static [AccessRole] {
        match self {
            Privilege::ShowGuestList => &[AccessRole::Member, AccessRole::Owner, AccessRole::Admin],
            Privilege::EditGuestList => &[AccessRole::Member, AccessRole::Owner, AccessRole::Admin],
            Privilege::SubmitGuestList => &[AccessRole::Owner],
            Privilege::ExportGuestList => &[AccessRole::Admin],
            Privilege::ManageEventStatus => &[AccessRole::Admin],
            Privilege::ListAllEvents => &[AccessRole::Admin],
            Privilege::CreateEvents => &[AccessRole::Admin],
        }
    }
}
