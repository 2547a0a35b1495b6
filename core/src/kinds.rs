//! Managed resource kinds and their field schemas.

use crate::resource_kind;
use crate::schema::FieldSpec;

const MACHINE_TYPES: &[&str] = &[
    "pc",
    "pc-i440fx-2.7",
    "pc-i440fx-2.8",
    "pc-i440fx-2.9",
    "pc-i440fx-2.10",
    "pc-i440fx-2.11",
    "pc-i440fx-2.12",
    "pc-i440fx-3.0",
    "pc-i440fx-3.1",
    "pc-i440fx-4.0",
    "pc-i440fx-4.1",
    "pc-i440fx-4.2",
    "pc-i440fx-5.0",
    "pc-i440fx-5.1",
    "pc-i440fx-5.2",
    "pc-i440fx-6.0",
    "pc-i440fx-6.1",
    "pc-i440fx-6.2",
    "pc-i440fx-7.0",
    "pc-i440fx-7.1",
    "pc-i440fx-7.2",
    "pc-i440fx-8.0",
    "pc-i440fx-8.1",
    "q35",
    "pc-q35-2.7",
    "pc-q35-2.8",
    "pc-q35-2.9",
    "pc-q35-2.10",
    "pc-q35-2.11",
    "pc-q35-2.12",
    "pc-q35-3.0",
    "pc-q35-3.1",
    "pc-q35-4.0",
    "pc-q35-4.1",
    "pc-q35-4.2",
    "pc-q35-5.0",
    "pc-q35-5.1",
    "pc-q35-5.2",
    "pc-q35-6.0",
    "pc-q35-6.1",
    "pc-q35-6.2",
    "pc-q35-7.0",
    "pc-q35-7.1",
    "pc-q35-7.2",
    "pc-q35-8.0",
    "pc-q35-8.1",
    "yottabyte",
];

const OS_FAMILIES: &[&str] = &["linux", "windows", "freebsd", "other"];

const DRIVE_INTERFACES: &[&str] = &[
    "virtio",
    "ide",
    "ahci",
    "lsi53c895a",
    "megasas",
    "megasas-gen2",
    "mptsas1068",
    "virtio-scsi",
    "virtio-scsi-dedicated",
];

const DRIVE_MEDIA: &[&str] = &["cdrom", "disk", "efidisk", "import", "clone", "nonpersistent"];

const TIERS: &[&str] = &["1", "2", "3", "4", "5"];

const NIC_INTERFACES: &[&str] = &["virtio", "e1000", "rtl8139", "pcnet", "direct"];

const USER_TYPES: &[&str] = &["normal", "api", "vdi"];

const POWER_LOSS: &[&str] = &["power_on", "leave_off", "last_state"];

resource_kind! {
    /// Virtual machines.
    pub struct Vm("vm", "api/v4/vms");
    pub enum VmField {
        Name => FieldSpec::string("name").required(),
        /// Machine record backing the VM; drives and NICs attach to it.
        Machine => FieldSpec::int("machine").computed(),
        Cluster => FieldSpec::int("cluster").nullable(),
        Description => FieldSpec::string("description"),
        Enabled => FieldSpec::boolean("enabled"),
        MachineType => FieldSpec::string("machine_type").one_of(MACHINE_TYPES),
        AllowHotplug => FieldSpec::boolean("allow_hotplug"),
        DisablePowercycle => FieldSpec::boolean("disable_powercycle"),
        CpuCores => FieldSpec::int("cpu_cores"),
        CpuType => FieldSpec::string("cpu_type"),
        Ram => FieldSpec::int("ram"),
        Console => FieldSpec::string("console"),
        Display => FieldSpec::string("display"),
        Video => FieldSpec::string("video"),
        Sound => FieldSpec::string("sound"),
        OsFamily => FieldSpec::string("os_family").one_of(OS_FAMILIES),
        OsDescription => FieldSpec::string("os_description"),
        RtcBase => FieldSpec::string("rtc_base"),
        BootOrder => FieldSpec::string("boot_order"),
        ConsolePassEnabled => FieldSpec::boolean("console_pass_enabled"),
        ConsolePass => FieldSpec::string("console_pass"),
        UsbTablet => FieldSpec::boolean("usb_tablet"),
        Uefi => FieldSpec::boolean("uefi"),
        SecureBoot => FieldSpec::boolean("secure_boot"),
        SerialPort => FieldSpec::boolean("serial_port"),
        BootDelay => FieldSpec::int("boot_delay"),
        PreferredNode => FieldSpec::int("preferred_node").nullable(),
        SnapshotProfile => FieldSpec::int("snapshot_profile").nullable(),
    }
}

resource_kind! {
    /// Drives attached to a VM's machine.
    pub struct Drive("drive", "api/v4/machine_drives");
    pub enum DriveField {
        Machine => FieldSpec::int("machine").required(),
        Name => FieldSpec::string("name").required(),
        Description => FieldSpec::string("description"),
        Interface => FieldSpec::string("interface").one_of(DRIVE_INTERFACES),
        Media => FieldSpec::string("media").one_of(DRIVE_MEDIA).create_only(),
        MediaSource => FieldSpec::int("media_source").nullable(),
        DiskSize => FieldSpec::int("disksize"),
        PreferredTier => FieldSpec::string("preferred_tier").one_of(TIERS),
        Enabled => FieldSpec::boolean("enabled"),
        ReadOnly => FieldSpec::boolean("readonly"),
        Serial => FieldSpec::string("serial"),
        Asset => FieldSpec::string("asset"),
        PreserveDriveFormat => FieldSpec::boolean("preserve_drive_format"),
    }
}

resource_kind! {
    /// Network interfaces attached to a VM's machine.
    pub struct Nic("nic", "api/v4/machine_nics");
    pub enum NicField {
        Machine => FieldSpec::int("machine").required(),
        Name => FieldSpec::string("name").required(),
        Description => FieldSpec::string("description"),
        Interface => FieldSpec::string("interface").one_of(NIC_INTERFACES),
        Driver => FieldSpec::string("driver"),
        Model => FieldSpec::string("model"),
        Vendor => FieldSpec::string("vendor"),
        Port => FieldSpec::int("port"),
        Enabled => FieldSpec::boolean("enabled"),
        Vnet => FieldSpec::int("vnet").nullable(),
        MacAddress => FieldSpec::string("macaddress"),
        Asset => FieldSpec::string("asset"),
    }
}

resource_kind! {
    /// User accounts.
    pub struct User("user", "api/v4/users");
    pub enum UserField {
        AuthSource => FieldSpec::int("auth_source").nullable().create_only(),
        Name => FieldSpec::string("name").required(),
        RemoteName => FieldSpec::string("remote_name"),
        Enabled => FieldSpec::boolean("enabled"),
        DisplayName => FieldSpec::string("displayname"),
        Email => FieldSpec::string("email"),
        Type => FieldSpec::string("type").one_of(USER_TYPES).create_only(),
        Password => FieldSpec::string("password"),
        ChangePassword => FieldSpec::boolean("change_password"),
    }
}

resource_kind! {
    /// Group memberships.
    pub struct Member("member", "api/v4/members");
    pub enum MemberField {
        Group => FieldSpec::int("parent_group").required(),
        /// Reference to the member, e.g. `/v4/users/3`.
        Member => FieldSpec::string("member").required(),
    }
}

resource_kind! {
    /// Virtual networks.
    pub struct Network("network", "api/v4/vnets");
    pub enum NetworkField {
        Name => FieldSpec::string("name").required(),
        Enabled => FieldSpec::boolean("enabled"),
        DefaultGateway => FieldSpec::int("vnet_default_gateway").nullable(),
        IpAddress => FieldSpec::string("ipaddress"),
        DhcpEnabled => FieldSpec::boolean("dhcp_enabled"),
        DhcpDynamic => FieldSpec::boolean("dhcp_dynamic"),
        DhcpSequential => FieldSpec::boolean("dhcp_sequential"),
        DhcpStart => FieldSpec::string("dhcp_start"),
        DhcpStop => FieldSpec::string("dhcp_stop"),
        OnPowerLoss => FieldSpec::string("on_power_loss").one_of(POWER_LOSS),
    }
}
