//! Definitions of Solidity functions called by the scripts

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ITestToken {
        function initialize(string memory name, string memory symbol, address recipient, address initialOwner) external;
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function owner() external view returns (address);
        function version() external view returns (string memory);
        function initializeV2() external;
        function updateTokenInfo(string memory newName, string memory newSymbol) external;
    }

    #[sol(rpc)]
    interface ITestNft {
        function initialize(string memory name, string memory symbol, string memory baseURI, address initialOwner) external;
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function owner() external view returns (address);
        function totalMinted() external view returns (uint256);
        function baseURI() external view returns (string memory);
        function version() external view returns (string memory);
        function safeMint(address to) external;
        function initializeV2() external;
        function updateCollectionInfo(string memory newName, string memory newSymbol) external;
        function setBaseURI(string memory newBaseURI) external;
    }

    #[sol(rpc)]
    interface IProxyAdmin {
        function upgradeAndCall(address proxy, address implementation, bytes memory data) external payable;
    }
}
